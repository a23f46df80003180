use std::sync::atomic::{AtomicU32, Ordering};

use mood_core::{Palette, Rgb};

/// Palette the render loops start from before any mood is published.
pub const FALLBACK_PALETTE: Palette = Palette::new(0x0b1220, 0x0f1628, 0xfde047, 0xe5e7eb);

/// Thread-safe palette slot using atomics.
///
/// Written by a single owner whenever the active mood changes and read by
/// the render loop on every drawn frame, so palette swaps need no extra
/// wiring and never block a frame.
#[derive(Debug)]
pub struct SharedPalette {
    bg1: AtomicU32,
    bg2: AtomicU32,
    accent: AtomicU32,
    text: AtomicU32,
}

impl Default for SharedPalette {
    fn default() -> Self {
        Self::new(FALLBACK_PALETTE)
    }
}

impl SharedPalette {
    pub fn new(initial: Palette) -> Self {
        Self {
            bg1: AtomicU32::new(initial.bg1.to_u32()),
            bg2: AtomicU32::new(initial.bg2.to_u32()),
            accent: AtomicU32::new(initial.accent.to_u32()),
            text: AtomicU32::new(initial.text.to_u32()),
        }
    }

    pub fn set(&self, palette: Palette) {
        self.bg1.store(palette.bg1.to_u32(), Ordering::Relaxed);
        self.bg2.store(palette.bg2.to_u32(), Ordering::Relaxed);
        self.accent
            .store(palette.accent.to_u32(), Ordering::Relaxed);
        self.text.store(palette.text.to_u32(), Ordering::Relaxed);
    }

    pub fn get(&self) -> Palette {
        Palette {
            bg1: Rgb::from_u32(self.bg1.load(Ordering::Relaxed)),
            bg2: Rgb::from_u32(self.bg2.load(Ordering::Relaxed)),
            accent: Rgb::from_u32(self.accent.load(Ordering::Relaxed)),
            text: Rgb::from_u32(self.text.load(Ordering::Relaxed)),
        }
    }
}
