use std::path::Path;
use std::time::Instant;

use kitten_tts::engines::kitten::{KittenTts, DEFAULT_SPEED, DEFAULT_VOICE, SAMPLE_RATE};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let model_name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "kitten-tts-nano-0.1".to_string());

    let load_start = Instant::now();
    let mut tts = KittenTts::new(&model_name, None)?;
    println!("Loaded {} in {:.2?}", tts.repo_id(), load_start.elapsed());

    println!("Available voices: {:?}", tts.available_voices());

    let text = "It begins with an \"Ugh!\" Another mysterious stain appears on a favorite shirt. \
                Every trick has been tried, but the stain persists.";

    let synth_start = Instant::now();
    let samples = tts.generate(text, DEFAULT_VOICE, DEFAULT_SPEED)?;
    let synth_dur = synth_start.elapsed();

    let audio_duration = samples.len() as f64 / SAMPLE_RATE as f64;
    println!(
        "Synthesized {:.2}s audio in {:.2?} ({:.1}x real-time)",
        audio_duration,
        synth_dur,
        audio_duration / synth_dur.as_secs_f64()
    );

    let output = Path::new("output.wav");
    tts.generate_to_file(text, output, "expr-voice-2-f", DEFAULT_SPEED, SAMPLE_RATE)?;
    println!("Saved to {}", output.display());

    Ok(())
}
