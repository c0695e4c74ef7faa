// Format constants for Licel measurement files

/// Padded width of every text line, excluding the CRLF terminator.
pub const LINE_WIDTH: usize = 78;

/// Two-byte sequence terminating each text line and each binary payload block.
pub const SEPARATOR: &[u8; 2] = b"\r\n";

/// Token count of a profile metadata line.
pub const PROFILE_TOKENS: usize = 16;

/// Field count of the measurement header line (line 2).
pub const MEASUREMENT_FIELDS: usize = 9;

/// Field count of the laser header line (line 3).
pub const LASER_FIELDS: usize = 7;

/// Bytes per payload sample (little-endian i32).
pub const SAMPLE_SIZE: usize = 4;

/// Reserved integer slots carried by each profile.
pub const MAX_RESERVED: usize = 3;

/// Timestamp layout used by the measurement header line.
pub const DATE_FORMAT: &str = "%d/%m/%Y";
pub const TIME_FORMAT: &str = "%H:%M:%S";
