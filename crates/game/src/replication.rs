//! Eye-angle replication.
//!
//! Remote observers only ever see where a player is looking. Nothing else
//! about movement crosses the network; remote copies are cosmetic and are
//! never simulated.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vaultrun_physics::CharacterState;

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),
}

/// View angles in radians. Positive pitch looks down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EyeAngles {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl EyeAngles {
    pub fn from_state(state: &CharacterState) -> Self {
        Self {
            pitch: state.eye_angles.x,
            yaw: state.eye_angles.y,
            roll: state.eye_angles.z,
        }
    }

    pub fn as_vec3(self) -> Vec3 {
        Vec3::new(self.pitch, self.yaw, self.roll)
    }
}

/// Encode eye angles to bytes.
pub fn encode(angles: &EyeAngles) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serde::encode_to_vec(angles, bincode::config::standard())?)
}

/// Decode eye angles from bytes. The buffer must hold exactly one value.
pub fn decode(data: &[u8]) -> Result<EyeAngles, CodecError> {
    let (angles, read) = bincode::serde::decode_from_slice(data, bincode::config::standard())?;
    if read != data.len() {
        return Err(CodecError::TrailingBytes(data.len() - read));
    }
    Ok(angles)
}

/// What an observer knows about another player.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RemoteView {
    pub eye_angles: EyeAngles,
}

impl RemoteView {
    /// Apply a replicated update.
    pub fn receive(&mut self, data: &[u8]) -> Result<(), CodecError> {
        self.eye_angles = decode(data)?;
        Ok(())
    }

    /// Direction the remote player is looking.
    pub fn look_direction(&self) -> Vec3 {
        let (sin_pitch, cos_pitch) = self.eye_angles.pitch.sin_cos();
        let (sin_yaw, cos_yaw) = self.eye_angles.yaw.sin_cos();

        Vec3::new(cos_pitch * cos_yaw, -sin_pitch, cos_pitch * sin_yaw)
    }
}
