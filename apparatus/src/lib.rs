//! Messages exchanged with the operant apparatus.
//!
//! Devices (keys, hoppers, house lights, the audio player) report partial
//! state changes as [`ApparatusEvent`]s and accept [`DeviceCommand`]s. Both
//! travel over an [`ApparatusBus`], which keeps transport concerns away from
//! the trial logic.

pub mod bus;
pub mod event;

pub use bus::ApparatusBus;
pub use event::{ApparatusEvent, DeviceCommand, APLAYER, EXPERIMENT, HOUSE_LIGHTS, KEYS};
