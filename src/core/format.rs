// Data structures for the Licel measurement format

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::core::constants::MAX_RESERVED;

/// One detector acquisition line (channel) within a measurement, either
/// photon-counting or analog, tagged with wavelength and polarization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicelProfile {
    #[serde(rename = "is_active")]
    pub active: bool,
    #[serde(rename = "is_photon")]
    pub photon: bool,
    pub laser_type: i64,
    /// Declared sample count; `data.len()` matches it after a load.
    #[serde(rename = "data_points")]
    pub n_data_points: i64,
    pub reserved: [i64; MAX_RESERVED],
    pub high_voltage: i64,
    /// Range bin width in nanoseconds.
    pub bin_width: f64,
    /// Wavelength in nanometres; integral by format, stored widened.
    pub wavelength: f64,
    /// Single-character polarization tag from the combined wavelength token.
    pub polarization: String,
    pub bin_shift: i64,
    pub dec_bin_shift: i64,
    pub adc_bits: i64,
    pub n_shots: i64,
    /// Discriminator level; 4 decimals on disk for photon channels, 3 for analog.
    pub discr_level: f64,
    /// Two-character digitizer device id.
    pub device_id: String,
    /// Slot index of the digitizer module within the acquisition chassis.
    pub n_crate: i64,
    /// Integral sample values widened from little-endian i32.
    pub data: Vec<f64>,
}

/// A single measurement file: three header lines, one metadata line per
/// channel, then one binary payload block per channel in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicelFile {
    #[serde(rename = "location")]
    pub site: String,
    pub start_time: NaiveDateTime,
    pub stop_time: NaiveDateTime,
    #[serde(rename = "lidar_altitude")]
    pub altitude: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub zenith: f64,
    pub laser1_nshots: i64,
    pub laser1_freq: i64,
    pub laser2_nshots: i64,
    pub laser2_freq: i64,
    /// Declared dataset count; `profiles.len()` matches it after a load.
    #[serde(rename = "dataset_count")]
    pub n_datasets: i64,
    pub laser3_nshots: i64,
    pub laser3_freq: i64,
    #[serde(skip)]
    pub loaded: bool,
    #[serde(rename = "datasets")]
    pub profiles: Vec<LicelProfile>,
}

impl LicelFile {
    /// Returns every channel whose detection mode and wavelength match.
    ///
    /// Channels with wavelength 0 are never returned, even when requested:
    /// zero marks an unconfigured channel slot in recorded data.
    pub fn select_channels(&self, photon: bool, wavelength: f64) -> Vec<&LicelProfile> {
        self.profiles
            .iter()
            .filter(|p| p.wavelength != 0.0 && p.photon == photon && p.wavelength == wavelength)
            .collect()
    }
}
