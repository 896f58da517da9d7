//! Scripted in-memory audio backend for tests.
//!
//! Models a small set of devices with per-element volume tables, optional
//! mute controls, and failure injection for identity resolution and
//! property writes.

use std::cell::RefCell;
use std::collections::HashMap;

use super::backend::AudioBackend;
use super::device::{AudioError, DeviceId, VolumeElement, NO_DEVICE};

#[derive(Debug, Clone, Copy)]
struct ElementState {
    level: f32,
    settable: bool,
}

#[derive(Debug, Default)]
struct MockDevice {
    uid: String,
    name: String,
    input_channels: u32,
    master: Option<ElementState>,
    channels: HashMap<u32, ElementState>,
    mute: Option<bool>,
    name_broken: bool,
}

#[derive(Debug, Default)]
struct MockState {
    devices: HashMap<DeviceId, MockDevice>,
    order: Vec<DeviceId>,
    default_input: DeviceId,
    failing_volume_writes: Vec<(DeviceId, VolumeElement)>,
    failing_mute_writes: Vec<DeviceId>,
}

/// In-memory [`AudioBackend`] with scripted devices.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: RefCell<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_input_device(&self, id: DeviceId, uid: &str, name: &str, channels: u32) {
        let mut state = self.state.borrow_mut();
        state.devices.insert(
            id,
            MockDevice {
                uid: uid.to_string(),
                name: name.to_string(),
                input_channels: channels,
                ..Default::default()
            },
        );
        state.order.push(id);
    }

    pub fn add_output_device(&self, id: DeviceId, uid: &str, name: &str) {
        self.add_input_device(id, uid, name, 0);
    }

    pub fn set_default(&self, id: DeviceId) {
        self.state.borrow_mut().default_input = id;
    }

    pub fn set_master_volume(&self, id: DeviceId, level: f32, settable: bool) {
        if let Some(dev) = self.state.borrow_mut().devices.get_mut(&id) {
            dev.master = Some(ElementState { level, settable });
        }
    }

    pub fn set_channel_volume(&self, id: DeviceId, channel: u32, level: f32, settable: bool) {
        if let Some(dev) = self.state.borrow_mut().devices.get_mut(&id) {
            dev.channels.insert(channel, ElementState { level, settable });
        }
    }

    pub fn enable_mute_control(&self, id: DeviceId, muted: bool) {
        if let Some(dev) = self.state.borrow_mut().devices.get_mut(&id) {
            dev.mute = Some(muted);
        }
    }

    pub fn break_name_resolution(&self, id: DeviceId) {
        if let Some(dev) = self.state.borrow_mut().devices.get_mut(&id) {
            dev.name_broken = true;
        }
    }

    pub fn fail_volume_writes(&self, id: DeviceId, element: VolumeElement) {
        self.state.borrow_mut().failing_volume_writes.push((id, element));
    }

    pub fn fail_mute_writes(&self, id: DeviceId) {
        self.state.borrow_mut().failing_mute_writes.push(id);
    }

    pub fn master_volume(&self, id: DeviceId) -> Option<f32> {
        self.state
            .borrow()
            .devices
            .get(&id)
            .and_then(|d| d.master)
            .map(|e| e.level)
    }

    pub fn channel_volume(&self, id: DeviceId, channel: u32) -> Option<f32> {
        self.state
            .borrow()
            .devices
            .get(&id)
            .and_then(|d| d.channels.get(&channel).copied())
            .map(|e| e.level)
    }

    pub fn muted(&self, id: DeviceId) -> Option<bool> {
        self.state.borrow().devices.get(&id).and_then(|d| d.mute)
    }

    fn element(&self, id: DeviceId, element: VolumeElement) -> Option<ElementState> {
        let state = self.state.borrow();
        let dev = state.devices.get(&id)?;
        match element {
            VolumeElement::Main => dev.master,
            VolumeElement::Channel(ch) => dev.channels.get(&ch).copied(),
        }
    }
}

impl AudioBackend for MockBackend {
    fn device_ids(&self) -> Result<Vec<DeviceId>, AudioError> {
        Ok(self.state.borrow().order.clone())
    }

    fn input_channel_count(&self, id: DeviceId) -> u32 {
        self.state
            .borrow()
            .devices
            .get(&id)
            .map(|d| d.input_channels)
            .unwrap_or(0)
    }

    fn device_name(&self, id: DeviceId) -> Option<String> {
        let state = self.state.borrow();
        let dev = state.devices.get(&id)?;
        if dev.name_broken {
            return None;
        }
        Some(dev.name.clone())
    }

    fn device_uid(&self, id: DeviceId) -> Option<String> {
        self.state.borrow().devices.get(&id).map(|d| d.uid.clone())
    }

    fn default_input_device(&self) -> Result<DeviceId, AudioError> {
        Ok(self.state.borrow().default_input)
    }

    fn set_default_input_device(&self, id: DeviceId) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        if id == NO_DEVICE || !state.devices.contains_key(&id) {
            return Err(AudioError::query(-1, "set default input device"));
        }
        state.default_input = id;
        Ok(())
    }

    fn has_volume_control(&self, id: DeviceId, element: VolumeElement) -> bool {
        self.element(id, element).is_some()
    }

    fn volume_is_settable(&self, id: DeviceId, element: VolumeElement) -> bool {
        self.element(id, element).map(|e| e.settable).unwrap_or(false)
    }

    fn read_volume(&self, id: DeviceId, element: VolumeElement) -> Result<f32, AudioError> {
        self.element(id, element)
            .map(|e| e.level)
            .ok_or_else(|| AudioError::query(-1, "read volume"))
    }

    fn write_volume(
        &self,
        id: DeviceId,
        element: VolumeElement,
        level: f32,
    ) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        if state.failing_volume_writes.contains(&(id, element)) {
            return Err(AudioError::query(-1, "write volume"));
        }
        let dev = state
            .devices
            .get_mut(&id)
            .ok_or_else(|| AudioError::query(-1, "write volume"))?;
        let slot = match element {
            VolumeElement::Main => dev.master.as_mut(),
            VolumeElement::Channel(ch) => dev.channels.get_mut(&ch),
        };
        match slot {
            Some(e) if e.settable => {
                e.level = level;
                Ok(())
            }
            _ => Err(AudioError::query(-1, "write volume")),
        }
    }

    fn has_mute_control(&self, id: DeviceId) -> bool {
        self.state
            .borrow()
            .devices
            .get(&id)
            .map(|d| d.mute.is_some())
            .unwrap_or(false)
    }

    fn read_mute(&self, id: DeviceId) -> Result<bool, AudioError> {
        self.state
            .borrow()
            .devices
            .get(&id)
            .and_then(|d| d.mute)
            .ok_or_else(|| AudioError::query(-1, "read mute"))
    }

    fn write_mute(&self, id: DeviceId, muted: bool) -> Result<(), AudioError> {
        let mut state = self.state.borrow_mut();
        if state.failing_mute_writes.contains(&id) {
            return Err(AudioError::query(-1, "write mute"));
        }
        match state.devices.get_mut(&id) {
            Some(dev) if dev.mute.is_some() => {
                dev.mute = Some(muted);
                Ok(())
            }
            _ => Err(AudioError::query(-1, "write mute")),
        }
    }
}
