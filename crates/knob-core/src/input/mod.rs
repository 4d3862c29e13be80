//! Encoder and push-button input.
//!
//! The board supplies an [`EncoderInput`] (a raw quadrature edge count plus
//! the button line level); [`GestureRecognizer`] turns successive samples of it
//! into discrete gestures.

mod gesture;

pub use gesture::GestureRecognizer;

/// Logic level of the push-button line. The button is active low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub const fn is_pressed(self) -> bool {
        matches!(self, Self::Low)
    }
}

impl From<bool> for Level {
    /// `true` is a high line.
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// Raw hardware signals behind one rotary encoder with push-button.
pub trait EncoderInput {
    /// Signed quadrature edge count since power-on. Four edges per detent on
    /// the usual mechanical encoders.
    fn raw_count(&mut self) -> i32;

    fn button_level(&mut self) -> Level;
}

impl<T: EncoderInput + ?Sized> EncoderInput for &mut T {
    fn raw_count(&mut self) -> i32 {
        (**self).raw_count()
    }

    fn button_level(&mut self) -> Level {
        (**self).button_level()
    }
}
