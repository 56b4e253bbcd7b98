pub mod clock;
pub mod notify;
pub mod period;
pub mod services;

pub use clock::{Clock, FixedClock, SystemClock};
pub use notify::{AlertNotifier, BudgetNotice, FilteredNotifier, RecordingNotifier, TracingNotifier};
pub use period::TimePeriod;
