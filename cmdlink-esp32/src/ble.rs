//! BLE GATT server exposing the command characteristic
//!
//! Writes, reads and disconnects from the NimBLE callbacks are turned into
//! `TransportEvent`s and dispatched on the shared adapter. NimBLE runs all
//! callbacks on its host task, so the mutex is never contended by two peers.

use esp32_nimble::{uuid128, BLEAdvertisementData, BLEDevice, NimbleProperties, utilities::BleUuid};
use log::*;
use std::sync::{Arc, Mutex};

use cmdlink_mcu::{CommandServer, TransportAdapter, TransportEvent};

use crate::shell::FirmwareShell;

// These must match cmdlink_proto::ble::{SERVICE_UUID, COMMAND_UUID}
const SERVICE_UUID: BleUuid = uuid128!("c3d10000-6c6e-4b21-8000-000000000000");
const COMMAND_UUID: BleUuid = uuid128!("c3d10001-6c6e-4b21-8000-000000000000");

pub type SharedAdapter = Arc<Mutex<TransportAdapter<FirmwareShell>>>;

pub struct NimbleServer {
    device: &'static mut BLEDevice,
}

/// Start the GATT server with the command characteristic wired to `adapter`
pub fn start_command_server(adapter: SharedAdapter) -> NimbleServer {
    let ble_device = BLEDevice::take();
    let server = ble_device.get_server();

    // Re-advertise so the next peer can find us
    server.advertise_on_disconnect(true);

    let connect_adapter = adapter.clone();
    server.on_connect(move |server, desc| {
        let _ = server.update_conn_params(desc.conn_handle(), 24, 48, 0, 60);
        if let Ok(mut adapter) = connect_adapter.lock() {
            adapter.dispatch(TransportEvent::Connected);
        }
    });

    let disconnect_adapter = adapter.clone();
    server.on_disconnect(move |_desc, reason| {
        if let Err(e) = reason {
            debug!("BLE disconnect reason: {:?}", e);
        }
        if let Ok(mut adapter) = disconnect_adapter.lock() {
            adapter.dispatch(TransportEvent::Disconnected);
        }
    });

    let service = server.create_service(SERVICE_UUID);

    let command_char = service.lock().create_characteristic(
        COMMAND_UUID,
        NimbleProperties::READ | NimbleProperties::WRITE,
    );

    let write_adapter = adapter.clone();
    command_char.lock().on_write(move |args| {
        let data = args.recv_data();
        match write_adapter.lock() {
            Ok(mut adapter) => {
                adapter.dispatch(TransportEvent::Write(data));
                let channel = adapter.channel_mut();
                if let Some(passcode) = channel.shell_mut().take_pending_passcode() {
                    channel.reset_passcode(passcode);
                }
            }
            Err(_) => warn!("BLE: channel lock poisoned, dropping write"),
        }
    });

    let read_adapter = adapter;
    command_char.lock().on_read(move |value, _desc| {
        match read_adapter.lock() {
            Ok(mut adapter) => {
                if let Some(chunk) = adapter.dispatch(TransportEvent::Read) {
                    value.set_value(&chunk);
                }
            }
            Err(_) => {
                warn!("BLE: channel lock poisoned, answering empty");
                value.set_value(cmdlink_proto::ble::sentinels::EMPTY);
            }
        }
    });

    NimbleServer { device: ble_device }
}

impl CommandServer for NimbleServer {
    type Error = esp32_nimble::BLEError;

    fn start_advertising(&mut self, device_name: &str) -> Result<(), Self::Error> {
        BLEDevice::set_device_name(device_name)?;
        let advertising = self.device.get_advertising();
        advertising.lock().set_data(
            BLEAdvertisementData::new()
                .name(device_name)
                .add_service_uuid(SERVICE_UUID),
        )?;
        advertising.lock().start()?;
        info!("BLE advertising started as '{}'", device_name);
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), Self::Error> {
        self.device.get_advertising().lock().stop()?;
        info!("BLE advertising stopped");
        Ok(())
    }
}
