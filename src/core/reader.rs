// Licel measurement file parsing

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::core::codec;
use crate::core::constants::{
    DATE_FORMAT, LASER_FIELDS, MEASUREMENT_FIELDS, PROFILE_TOKENS, SAMPLE_SIZE, SEPARATOR,
    TIME_FORMAT,
};
use crate::core::error::{LicelError, Result};
use crate::core::format::{LicelFile, LicelProfile};

/// Forward-only view over the raw file bytes.
///
/// Text lines and binary blocks interleave in this format, so the same
/// cursor serves both: `read_line` for header/metadata text, `take` for
/// payload blocks and separators.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Advances past the next LF without decoding the bytes in between;
    /// the free-form first line may contain arbitrary data.
    fn skip_line(&mut self) -> Result<()> {
        let rest = &self.data[self.pos..];
        let newline = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| LicelError::Format("unexpected end of file inside text block".into()))?;
        self.pos += newline + 1;
        Ok(())
    }

    /// Reads up to and including the next LF, returning the line with
    /// trailing tabs, CR and spaces removed.
    fn read_line(&mut self) -> Result<&'a str> {
        let start = self.pos;
        self.skip_line()?;
        let line = std::str::from_utf8(&self.data[start..self.pos - 1])
            .map_err(|_| LicelError::Format("text line is not valid UTF-8".into()))?;
        Ok(line.trim_end_matches(['\t', '\r', ' ']))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let available = self.data.len() - self.pos;
        if n > available {
            return Err(LicelError::TruncatedData {
                expected: n,
                available,
            });
        }
        let block = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(block)
    }

    fn skip_separator(&mut self) -> Result<()> {
        self.take(SEPARATOR.len()).map(|_| ())
    }
}

fn parse_int(token: &str, what: &str) -> Result<i64> {
    token
        .parse()
        .map_err(|_| LicelError::Format(format!("bad integer {what}: {token:?}")))
}

fn parse_float(token: &str, what: &str) -> Result<f64> {
    token
        .parse()
        .map_err(|_| LicelError::Format(format!("bad number {what}: {token:?}")))
}

fn parse_flag(token: &str, what: &str) -> Result<bool> {
    match token {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(LicelError::Format(format!("bad flag {what}: {token:?}"))),
    }
}

fn parse_timestamp(date: &str, time: &str) -> Result<NaiveDateTime> {
    let combined = format!("{date} {time}");
    let layout = format!("{DATE_FORMAT} {TIME_FORMAT}");
    NaiveDateTime::parse_from_str(&combined, &layout)
        .map_err(|e| LicelError::Format(format!("bad timestamp {combined:?}: {e}")))
}

fn block_size(n_data_points: i64) -> Result<usize> {
    usize::try_from(n_data_points)
        .ok()
        .and_then(|count| count.checked_mul(SAMPLE_SIZE))
        .ok_or_else(|| LicelError::Format(format!("bad sample count: {n_data_points}")))
}

impl LicelProfile {
    /// Parses one 16-token metadata line into a channel descriptor.
    ///
    /// Token 7 combines wavelength and polarization (`00355.o`); token 15
    /// combines the device id and crate slot (`BT0`). The sample sequence
    /// stays empty here; the file assembler fills it from the payload block.
    pub fn from_metadata_line(line: &str) -> Result<Self> {
        let items: Vec<&str> = line.split_whitespace().collect();
        if items.len() < PROFILE_TOKENS {
            return Err(LicelError::Format(format!(
                "metadata line has {} tokens, expected {PROFILE_TOKENS}",
                items.len()
            )));
        }

        let (wavelength, polarization) = items[7].split_once('.').ok_or_else(|| {
            LicelError::Format(format!("bad wavelength token: {:?}", items[7]))
        })?;

        let device = items[15];
        let (device_id, crate_token) = match (device.get(..2), device.get(2..)) {
            (Some(id), Some(slot)) if !slot.is_empty() => (id, slot),
            _ => {
                return Err(LicelError::Format(format!(
                    "bad device token: {device:?}"
                )))
            }
        };

        Ok(LicelProfile {
            active: parse_flag(items[0], "active")?,
            photon: parse_flag(items[1], "photon")?,
            laser_type: parse_int(items[2], "laser type")?,
            n_data_points: parse_int(items[3], "sample count")?,
            reserved: [
                parse_int(items[4], "reserved[0]")?,
                parse_int(items[8], "reserved[1]")?,
                parse_int(items[9], "reserved[2]")?,
            ],
            high_voltage: parse_int(items[5], "high voltage")?,
            bin_width: parse_float(items[6], "bin width")?,
            wavelength: parse_float(wavelength, "wavelength")?,
            polarization: polarization.to_string(),
            bin_shift: parse_int(items[10], "bin shift")?,
            dec_bin_shift: parse_int(items[11], "decimal bin shift")?,
            adc_bits: parse_int(items[12], "ADC bits")?,
            n_shots: parse_int(items[13], "shot count")?,
            discr_level: parse_float(items[14], "discriminator level")?,
            device_id: device_id.to_string(),
            n_crate: parse_int(crate_token, "crate slot")?,
            data: Vec::new(),
        })
    }
}

impl LicelFile {
    /// Loads and parses a measurement file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// Parses a measurement file from raw bytes.
    ///
    /// Layout: one free-form line (discarded), the measurement line, the
    /// laser line, N metadata lines, a CRLF separator, then N payload
    /// blocks each followed by a CRLF separator. N is the dataset count
    /// declared on the laser line; channel identity is positional.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        cursor.skip_line()?;

        let line = cursor.read_line()?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MEASUREMENT_FIELDS {
            return Err(LicelError::Format(format!(
                "measurement line has {} fields, expected {MEASUREMENT_FIELDS}",
                fields.len()
            )));
        }
        let site = fields[0].to_string();
        let start_time = parse_timestamp(fields[1], fields[2])?;
        let stop_time = parse_timestamp(fields[3], fields[4])?;
        let altitude = parse_float(fields[5], "altitude")?;
        let longitude = parse_float(fields[6], "longitude")?;
        let latitude = parse_float(fields[7], "latitude")?;
        let zenith = parse_float(fields[8], "zenith")?;

        let line = cursor.read_line()?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < LASER_FIELDS {
            return Err(LicelError::Format(format!(
                "laser line has {} fields, expected {LASER_FIELDS}",
                fields.len()
            )));
        }
        let laser1_nshots = parse_int(fields[0], "laser1 shot count")?;
        let laser1_freq = parse_int(fields[1], "laser1 frequency")?;
        let laser2_nshots = parse_int(fields[2], "laser2 shot count")?;
        let laser2_freq = parse_int(fields[3], "laser2 frequency")?;
        let n_datasets = parse_int(fields[4], "dataset count")?;
        let laser3_nshots = parse_int(fields[5], "laser3 shot count")?;
        let laser3_freq = parse_int(fields[6], "laser3 frequency")?;

        let count: usize = n_datasets
            .try_into()
            .map_err(|_| LicelError::Format(format!("bad dataset count: {n_datasets}")))?;

        let mut profiles = Vec::with_capacity(count);
        for _ in 0..count {
            profiles.push(LicelProfile::from_metadata_line(cursor.read_line()?)?);
        }

        cursor.skip_separator()?;
        for profile in &mut profiles {
            let block = cursor.take(block_size(profile.n_data_points)?)?;
            profile.data = codec::decode_samples(block);
            cursor.skip_separator()?;
        }

        Ok(LicelFile {
            site,
            start_time,
            stop_time,
            altitude,
            longitude,
            latitude,
            zenith,
            laser1_nshots,
            laser1_freq,
            laser2_nshots,
            laser2_freq,
            n_datasets,
            laser3_nshots,
            laser3_freq,
            loaded: true,
            profiles,
        })
    }
}
