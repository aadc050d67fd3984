use padbus_bit_derive::Bit;
use padbus_bit_mask::{Bitable, Bitmask};

/// Face buttons of a pad, with the shoulder pair placed at bit 8.
#[derive(Bit, Debug, Clone, Copy, PartialEq, Eq)]
enum PadButton {
    A,
    B,
    X,
    Y,
    LeftShoulder = 8,
    RightShoulder,
}

fn main() {
    let chord = Bitmask::new(&[PadButton::A, PadButton::RightShoulder]);
    println!("Chord: {chord:?} (raw {:#06x})", chord.value());

    let mut held = chord;
    held.insert(PadButton::Y);
    println!("Held is superset of chord: {}", held.is_superset(&chord));

    println!("Held buttons:");
    for button in held {
        println!("  {:?}: bit={:#06x}, index={}", button, button.bit(), button.index());
    }
}
