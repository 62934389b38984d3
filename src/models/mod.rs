pub mod assessment;
pub mod competency;
pub mod event;
pub mod lenient;
pub mod marks;
pub mod user;
