//! Passcode persistence in ESP32 NVS (Non-Volatile Storage)

use cmdlink_mcu::Storage;
use esp_idf_svc::nvs::{EspNvs, EspNvsPartition, NvsDefault};
use esp_idf_svc::sys::EspError;

const NVS_NAMESPACE: &str = "cmdlink";
const KEY_PASSCODE: &str = "passcode";
const KEY_LOCKED: &str = "locked";

pub struct NvsStorage {
    nvs: EspNvs<NvsDefault>,
}

impl NvsStorage {
    pub fn open(partition: &EspNvsPartition<NvsDefault>) -> Result<Self, EspError> {
        let nvs = EspNvs::new(partition.clone(), NVS_NAMESPACE, true)?;
        Ok(Self { nvs })
    }

    pub fn load_locked(&self) -> bool {
        matches!(self.nvs.get_u8(KEY_LOCKED), Ok(Some(1)))
    }

    pub fn save_locked(&mut self, locked: bool) -> Result<(), EspError> {
        self.nvs.set_u8(KEY_LOCKED, u8::from(locked))
    }
}

impl Storage for NvsStorage {
    type Error = EspError;

    fn get_passcode(&self) -> Result<Option<String>, EspError> {
        let Some(len) = self.nvs.str_len(KEY_PASSCODE)? else {
            return Ok(None);
        };
        let mut buf = vec![0u8; len];
        Ok(self
            .nvs
            .get_str(KEY_PASSCODE, &mut buf)?
            .map(str::to_string))
    }

    fn set_passcode(&mut self, passcode: &str) -> Result<(), EspError> {
        self.nvs.set_str(KEY_PASSCODE, passcode)
    }

    fn clear_passcode(&mut self) -> Result<(), EspError> {
        self.nvs.remove(KEY_PASSCODE)?;
        Ok(())
    }
}
