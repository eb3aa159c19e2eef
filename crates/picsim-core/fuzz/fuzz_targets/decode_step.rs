#![no_main]

use libfuzzer_sys::fuzz_target;
use picsim_core::{disassemble_word, CoreConfig, Decoder, Engine, WORD_MASK};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let words: Vec<u16> = data
        .chunks_exact(2)
        .take(256)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) & WORD_MASK)
        .collect();

    for &word in &words {
        let _ = Decoder::decode(word);
        let _ = disassemble_word(word);
    }

    let engine = Engine::new(CoreConfig {
        program_memory_words: 256,
        eeprom_bytes: 16,
        ..CoreConfig::default()
    });
    if engine.load(&words).is_err() {
        return;
    }
    engine.reset();
    let _ = engine.run(512, |_| false);
});
