// Licel measurement file serialization
//
// The writer mirrors the parser byte for byte: fixed-width zero-padded
// numeric fields, every text line right-padded with spaces to 78 columns,
// CRLF terminators throughout.

use std::fs;
use std::path::Path;

use crate::core::codec;
use crate::core::constants::{DATE_FORMAT, LINE_WIDTH, SEPARATOR, TIME_FORMAT};
use crate::core::error::Result;
use crate::core::format::{LicelFile, LicelProfile};

fn pad_line(content: &str) -> String {
    format!("{:<width$}\r\n", content, width = LINE_WIDTH)
}

impl LicelProfile {
    /// Renders the channel's metadata line, padded and CRLF-terminated.
    ///
    /// The discriminator level carries 4 decimals for photon channels and
    /// 3 for analog ones; the wavelength is written as a zero-padded
    /// 5-digit integer joined to the polarization tag.
    pub fn metadata_line(&self) -> String {
        let discr = if self.photon {
            format!("{:05.4}", self.discr_level)
        } else {
            format!("{:05.3}", self.discr_level)
        };
        let content = format!(
            " {} {} {} {:05} {} {:04} {:04.2} {:05}.{} {} {} {:02} {:03} {:02} {:06} {} {:>2}{}",
            self.active as i64,
            self.photon as i64,
            self.laser_type,
            self.n_data_points,
            self.reserved[0],
            self.high_voltage,
            self.bin_width,
            self.wavelength as i64,
            self.polarization,
            self.reserved[1],
            self.reserved[2],
            self.bin_shift,
            self.dec_bin_shift,
            self.adc_bits,
            self.n_shots,
            discr,
            self.device_id,
            self.n_crate,
        );
        pad_line(&content)
    }

    /// Encodes the channel's samples followed by the block separator.
    pub fn payload_block(&self) -> Vec<u8> {
        let mut block = codec::encode_samples(&self.data);
        block.extend_from_slice(SEPARATOR);
        block
    }
}

impl LicelFile {
    /// Serializes the whole file; `label` fills the free-form first line
    /// (conventionally the file name).
    pub fn to_bytes(&self, label: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(format!(" {:<width$}\r\n", label, width = LINE_WIDTH - 1).as_bytes());
        out.extend_from_slice(pad_line(&self.measurement_line()).as_bytes());
        out.extend_from_slice(pad_line(&self.laser_line()).as_bytes());
        for profile in &self.profiles {
            out.extend_from_slice(profile.metadata_line().as_bytes());
        }
        out.extend_from_slice(SEPARATOR);
        for profile in &self.profiles {
            out.extend_from_slice(&profile.payload_block());
        }
        out
    }

    /// Writes the serialized file to `path`, labelled with the path itself.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let label = path.to_string_lossy();
        fs::write(path, self.to_bytes(&label))?;
        Ok(())
    }

    fn measurement_line(&self) -> String {
        format!(
            " {} {} {} {} {} {:04.0} {:06.1} {:06.1} {:02.0}",
            self.site,
            self.start_time.format(DATE_FORMAT),
            self.start_time.format(TIME_FORMAT),
            self.stop_time.format(DATE_FORMAT),
            self.stop_time.format(TIME_FORMAT),
            self.altitude,
            self.longitude,
            self.latitude,
            self.zenith,
        )
    }

    fn laser_line(&self) -> String {
        format!(
            " {:07} {:04} {:07} {:04} {:02} {:07} {:04}",
            self.laser1_nshots,
            self.laser1_freq,
            self.laser2_nshots,
            self.laser2_freq,
            self.n_datasets,
            self.laser3_nshots,
            self.laser3_freq,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::SAMPLE_SIZE;
    use crate::core::reader::tests::{sample_file, sample_profile};

    #[test]
    fn test_analog_metadata_line_fixture() {
        let mut profile = sample_profile(false, 355.0, Vec::new());
        profile.n_data_points = 16380;
        let line = profile.metadata_line();
        assert_eq!(
            line.trim_end_matches(['\r', '\n', ' ']),
            " 1 0 1 16380 1 0000 7.50 00355.o 0 0 00 000 12 002001 0.500 BT0"
        );
    }

    #[test]
    fn test_photon_discriminator_has_four_decimals() {
        let profile = sample_profile(true, 408.0, Vec::new());
        assert!(profile.metadata_line().contains(" 0.5000 "));
    }

    #[test]
    fn test_measurement_line_fixture() {
        let line = sample_file().measurement_line();
        assert_eq!(
            line,
            " Vladivos 10/02/2020 19:22:35 10/02/2020 19:24:15 0020 0131.9 0043.1 50"
        );
    }

    #[test]
    fn test_laser_line_fixture() {
        let line = sample_file().laser_line();
        assert_eq!(line, " 0002001 0010 0000000 0000 02 0000000 0000");
    }

    #[test]
    fn test_text_lines_are_padded_to_width() {
        let bytes = sample_file().to_bytes("b2021019.223500");
        // first line + 2 header lines + 2 metadata lines, each 78 cols + CRLF
        for i in 0..5 {
            let line = &bytes[i * (LINE_WIDTH + 2)..(i + 1) * (LINE_WIDTH + 2)];
            assert_eq!(line.len(), LINE_WIDTH + 2);
            assert_eq!(&line[LINE_WIDTH..], b"\r\n");
        }
    }

    #[test]
    fn test_payload_section_layout() {
        let file = sample_file();
        let bytes = file.to_bytes("x");
        let text_section = 5 * (LINE_WIDTH + 2) + SEPARATOR.len();
        let payload_section: usize = file
            .profiles
            .iter()
            .map(|p| p.data.len() * SAMPLE_SIZE + SEPARATOR.len())
            .sum();
        assert_eq!(bytes.len(), text_section + payload_section);
        assert_eq!(&bytes[bytes.len() - 2..], b"\r\n");
    }

    #[test]
    fn test_save_then_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("b2021019.223500");

        let file = sample_file();
        file.save(&path).unwrap();

        let reloaded = LicelFile::open(&path).unwrap();
        assert_eq!(reloaded.site, file.site);
        assert_eq!(reloaded.profiles, file.profiles);
    }
}
