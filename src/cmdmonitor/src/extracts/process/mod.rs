mod elapsed;
mod host;
mod proc_fs;
mod ps;

pub use elapsed::{parse_elapsed_time, start_time_from_elapsed};
pub use host::{HostProcessTable, HostProcesses};
pub use ps::{parse_ps_row, parse_ps_usage, PsRow, PsUsage, PS_COLUMNS, USAGE_COLUMNS};
