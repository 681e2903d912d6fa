//! Data models for Biblio

pub mod book;
pub mod loan;
pub mod member;
pub mod return_event;

// Re-export commonly used types
pub use book::Book;
pub use loan::{Loan, LoanSchedule, LoanSummary, NewLoan};
pub use member::Member;
pub use return_event::{NewReturnEvent, ReturnEvent, ReturnEventSummary};
