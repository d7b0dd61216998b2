pub mod aggregate;
pub mod bucketing;
pub mod calculators;
pub mod clock;
pub mod recurring;
pub mod reminders;
pub mod scheduler;
pub mod services;
