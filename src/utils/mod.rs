pub mod text;
pub mod time;

pub use text::normalize_code;
pub use time::{date_to_epoch, end_epoch_or_now, epoch_to_date, now_epoch, parse_date};
