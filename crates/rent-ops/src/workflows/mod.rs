pub mod accounting;
pub mod reminders;
