/// Volume identifiers and layout limits

use crate::error::{DiscError, Result};
use crate::format::field::iso_identifier;

/// Default boot descriptor file, sorted first in the root directory
pub const DEFAULT_BOOT_FILE: &str = "SYSTEM.CNF";

/// Default cap on sectors used by one directory's records or identifiers
pub const DEFAULT_MAX_DIRECTORY_SECTORS: u32 = 32;

/// ISO9660 a-characters, the set allowed in primary volume descriptor strings
pub fn is_a_character(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || " !\"%&'()*+,-./:;<=>?_".contains(c)
}

/// Volume specification written into the image descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    /// System identifier (ISO9660 PVD, UDF application identifier)
    pub system_identifier: String,
    /// Volume identifier (ISO9660 PVD, UDF volume/logical volume/file set identifiers)
    pub volume_identifier: String,
    /// Volume set identifier (ISO9660 PVD)
    pub volume_set_identifier: String,
    /// Publisher identifier
    pub publisher_identifier: String,
    /// Data preparer identifier
    pub data_preparer_identifier: String,
    /// Application identifier
    pub application_identifier: String,
    /// Copyright file identifier
    pub copyright_identifier: String,
    /// File sorted first in the root directory (case-insensitive)
    pub boot_file: String,
    /// Maximum sectors for one directory record block or identifier region
    pub max_directory_sectors: u32,
}

impl VolumeSpec {
    /// Create a specification with the given volume identifier and PS2 defaults
    pub fn new(volume_identifier: &str) -> Self {
        Self {
            volume_identifier: volume_identifier.to_string(),
            ..Self::ps2_dvd()
        }
    }

    /// PS2 DVD defaults
    pub fn ps2_dvd() -> Self {
        Self {
            system_identifier: "PLAYSTATION".to_string(),
            volume_identifier: "PS2DISC".to_string(),
            volume_set_identifier: String::new(),
            publisher_identifier: String::new(),
            data_preparer_identifier: String::new(),
            application_identifier: "PLAYSTATION".to_string(),
            copyright_identifier: String::new(),
            boot_file: DEFAULT_BOOT_FILE.to_string(),
            max_directory_sectors: DEFAULT_MAX_DIRECTORY_SECTORS,
        }
    }

    /// Set the volume identifier
    pub fn with_volume_identifier(mut self, id: &str) -> Self {
        self.volume_identifier = id.to_string();
        self
    }

    /// Set the publisher identifier
    pub fn with_publisher(mut self, id: &str) -> Self {
        self.publisher_identifier = id.to_string();
        self
    }

    /// Set the data preparer identifier
    pub fn with_data_preparer(mut self, id: &str) -> Self {
        self.data_preparer_identifier = id.to_string();
        self
    }

    /// Set the copyright identifier
    pub fn with_copyright(mut self, id: &str) -> Self {
        self.copyright_identifier = id.to_string();
        self
    }

    /// Set the boot descriptor file name
    pub fn with_boot_file(mut self, name: &str) -> Self {
        self.boot_file = name.to_string();
        self
    }

    /// Set the multi-sector directory cap
    pub fn with_max_directory_sectors(mut self, sectors: u32) -> Self {
        self.max_directory_sectors = sectors.max(1);
        self
    }

    /// Check every identifier can be written into the ISO9660 descriptor
    ///
    /// Identifiers are upper-cased when written; anything still outside the
    /// a-character set is rejected.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("system", &self.system_identifier),
            ("volume", &self.volume_identifier),
            ("volume set", &self.volume_set_identifier),
            ("publisher", &self.publisher_identifier),
            ("data preparer", &self.data_preparer_identifier),
            ("application", &self.application_identifier),
            ("copyright", &self.copyright_identifier),
        ];
        for (field, value) in fields {
            if !iso_identifier(value).chars().all(is_a_character) {
                return Err(DiscError::InvalidIdentifier {
                    field,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Check whether a root entry name is the boot descriptor file
    pub fn is_boot_file(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.boot_file)
    }
}

impl Default for VolumeSpec {
    fn default() -> Self {
        Self::ps2_dvd()
    }
}
