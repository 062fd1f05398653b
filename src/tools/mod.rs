mod media_probe;
mod path_validator;
mod time_format;
mod video_scanner;

pub use media_probe::{
    DurationProbe, FfmpegBannerProbe, FfprobeProbe, MediaDuration, StreamLayout, StreamProbe,
    parse_banner_duration, parse_banner_streams,
};
pub use path_validator::{ensure_directory_exists, validate_directory_exists, validate_file_exists};
pub use time_format::{format_duration, format_elapsed, format_hms};
pub use video_scanner::{VideoFileInfo, scan_video_files};
