pub mod average;
pub mod collect;
pub mod driver;
pub mod meridiem;
pub mod page;
pub mod record;
