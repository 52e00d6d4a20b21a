//! RT-safe MIDI event types with sample-accurate timing.

use midi_msg::{Channel, ChannelVoiceMsg, MidiMsg};

use crate::error::{Error, Result};

const NOTE_OFF_STATUS: u8 = 0x80;
const NOTE_ON_STATUS: u8 = 0x90;

/// RT-safe MIDI event with sample-accurate frame offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiEvent {
    /// Offset within the current block (0 = first sample).
    pub frame_offset: usize,
    pub channel: Channel,
    pub msg: ChannelVoiceMsg,
}

impl MidiEvent {
    #[inline]
    pub fn note_on(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            frame_offset,
            channel: Channel::from_u8(channel),
            msg: ChannelVoiceMsg::NoteOn { note, velocity },
        }
    }

    #[inline]
    pub fn note_off(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self {
            frame_offset,
            channel: Channel::from_u8(channel),
            msg: ChannelVoiceMsg::NoteOff { note, velocity },
        }
    }

    #[inline]
    pub fn control_change(frame_offset: usize, channel: u8, cc: u8, value: u8) -> Self {
        Self {
            frame_offset,
            channel: Channel::from_u8(channel),
            msg: ChannelVoiceMsg::ControlChange {
                control: midi_msg::ControlChange::CC { control: cc, value },
            },
        }
    }

    #[inline]
    pub fn channel_num(&self) -> u8 {
        self.channel as u8
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self.msg, ChannelVoiceMsg::NoteOn { velocity, .. } if velocity > 0)
    }

    /// Note-off, or note-on with velocity 0.
    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(
            self.msg,
            ChannelVoiceMsg::NoteOff { .. } | ChannelVoiceMsg::NoteOn { velocity: 0, .. }
        )
    }

    #[inline]
    pub fn note(&self) -> Option<u8> {
        match self.msg {
            ChannelVoiceMsg::NoteOn { note, .. }
            | ChannelVoiceMsg::NoteOff { note, .. }
            | ChannelVoiceMsg::PolyPressure { note, .. } => Some(note),
            _ => None,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Option<u8> {
        match self.msg {
            ChannelVoiceMsg::NoteOn { velocity, .. }
            | ChannelVoiceMsg::NoteOff { velocity, .. } => Some(velocity),
            _ => None,
        }
    }

    #[inline]
    pub fn to_midi_msg(&self) -> MidiMsg {
        MidiMsg::ChannelVoice {
            channel: self.channel,
            msg: self.msg,
        }
    }

    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_midi_msg().to_midi()
    }

    pub fn from_bytes_with_offset(bytes: &[u8], frame_offset: usize) -> Result<Self> {
        let (msg, _len) = MidiMsg::from_midi(bytes).map_err(Error::Parse)?;
        match msg {
            MidiMsg::ChannelVoice { channel, msg } => Ok(Self {
                frame_offset,
                channel,
                msg,
            }),
            _ => Err(Error::NotChannelVoice),
        }
    }
}

/// Raw 3-byte MIDI event as delivered by a plugin host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct RawMidiEvent {
    pub frame_offset: usize,
    pub data: [u8; 3],
    /// Valid bytes in `data` (0-3).
    pub len: u8,
}

impl RawMidiEvent {
    #[inline]
    pub fn new(frame_offset: usize, data: [u8; 3], len: u8) -> Self {
        Self {
            frame_offset,
            data,
            len,
        }
    }

    #[inline]
    pub fn status(&self) -> u8 {
        self.data[0] & 0xF0
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        self.data[0] & 0x0F
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data[..(self.len as usize).min(3)]
    }

    pub fn to_midi_event(&self) -> Result<MidiEvent> {
        if self.len == 0 {
            return Err(Error::Empty);
        }
        MidiEvent::from_bytes_with_offset(self.bytes(), self.frame_offset)
    }
}

impl From<MidiEvent> for RawMidiEvent {
    fn from(event: MidiEvent) -> Self {
        // Note messages are encoded directly; they are the only thing the audio
        // thread emits and must not allocate.
        let channel = event.channel_num() & 0x0F;
        match event.msg {
            ChannelVoiceMsg::NoteOn { note, velocity } => Self::new(
                event.frame_offset,
                [NOTE_ON_STATUS | channel, note & 0x7F, velocity & 0x7F],
                3,
            ),
            ChannelVoiceMsg::NoteOff { note, velocity } => Self::new(
                event.frame_offset,
                [NOTE_OFF_STATUS | channel, note & 0x7F, velocity & 0x7F],
                3,
            ),
            _ => {
                let bytes = event.to_bytes();
                let mut data = [0u8; 3];
                let len = bytes.len().min(3);
                data[..len].copy_from_slice(&bytes[..len]);
                Self::new(event.frame_offset, data, len as u8)
            }
        }
    }
}
