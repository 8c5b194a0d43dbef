pub mod assertion;
pub mod escalate;
pub mod fatal;
pub mod recover;
pub mod uncaught;
