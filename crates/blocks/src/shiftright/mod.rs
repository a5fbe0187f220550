pub mod driver;
pub mod registers;
