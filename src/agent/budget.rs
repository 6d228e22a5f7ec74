//! Iteration budgets for the agent loop
//!
//! Two ceilings apply: generations across the whole run, and reasoning steps
//! within one task. Both are the only way a run is cut short.

/// Whether another reasoning step may start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetCheck {
    Available,
    /// The task used all of its reasoning steps
    StepsExhausted,
    /// The run used all of its iterations
    IterationsExhausted,
}

/// Budget shared by every task of one run
#[derive(Debug, Clone)]
pub struct RunBudget {
    iterations: usize,
    max_iterations: usize,
    max_steps_per_task: usize,
}

impl RunBudget {
    pub fn new(max_iterations: usize, max_steps_per_task: usize) -> Self {
        Self {
            iterations: 0,
            max_iterations,
            max_steps_per_task,
        }
    }

    /// Iterations consumed so far
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Check whether a task that already took `steps_taken` steps may take another
    pub fn check(&self, steps_taken: usize) -> BudgetCheck {
        if steps_taken >= self.max_steps_per_task {
            BudgetCheck::StepsExhausted
        } else if self.iterations >= self.max_iterations {
            BudgetCheck::IterationsExhausted
        } else {
            BudgetCheck::Available
        }
    }

    /// Consume one iteration
    pub fn next_iteration(&mut self) {
        self.iterations += 1;
    }

    /// Start over for a new run
    pub fn reset(&mut self) {
        self.iterations = 0;
    }
}
