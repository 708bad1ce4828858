//! Text-to-speech through whatever speech command the platform provides.

use std::collections::HashMap;
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};

pub const DEFAULT_LANGUAGE: &str = "en-US";

const TEXT_ENV: &str = "SLIDECAST_SPEECH_TEXT";

pub trait Speaker {
    fn is_available(&self) -> bool;

    /// Start speaking `text`. Returns once the utterance has been handed off.
    fn speak(&mut self, text: &str, language: &str) -> Result<()>;

    /// Stop the utterance in flight, if any.
    fn cancel(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Say,
    SpdSay,
    EspeakNg,
    Espeak,
    PowerShell,
}

impl Backend {
    fn binary_name(&self) -> &'static str {
        match self {
            Self::Say => "say",
            Self::SpdSay => "spd-say",
            Self::EspeakNg => "espeak-ng",
            Self::Espeak => "espeak",
            Self::PowerShell => "powershell",
        }
    }

    fn detect() -> Option<Self> {
        if cfg!(target_os = "macos") {
            return Some(Self::Say);
        }
        if cfg!(target_os = "windows") {
            return Some(Self::PowerShell);
        }
        [Self::SpdSay, Self::EspeakNg, Self::Espeak]
            .into_iter()
            .find(|b| b.is_available())
    }

    fn is_available(&self) -> bool {
        Command::new(self.binary_name())
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    /// `voice` is only used by `say`, which picks voices by name rather
    /// than by language.
    fn command(&self, text: &str, language: &str, voice: Option<&str>) -> Command {
        let mut cmd = Command::new(self.binary_name());
        // Keep text that starts with '-' from being read as a flag.
        let text = if text.starts_with('-') {
            format!(" {text}")
        } else {
            text.to_string()
        };
        match self {
            Self::Say => {
                if let Some(voice) = voice {
                    cmd.args(["-v", voice]);
                }
                cmd.arg(text);
            }
            Self::SpdSay => {
                cmd.args(["-l", primary_subtag(language)]).arg(text);
            }
            Self::EspeakNg | Self::Espeak => {
                cmd.args(["-v", &language.to_ascii_lowercase()]).arg(text);
            }
            Self::PowerShell => {
                cmd.args([
                    "-NoProfile",
                    "-Command",
                    "Add-Type -AssemblyName System.Speech; \
                     (New-Object System.Speech.Synthesis.SpeechSynthesizer)\
                     .Speak($env:SLIDECAST_SPEECH_TEXT)",
                ])
                .env(TEXT_ENV, text);
            }
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

fn primary_subtag(language: &str) -> &str {
    language.split(['-', '_']).next().unwrap_or(language)
}

/// Pick a voice for `language` from `say -v '?'` output. Lines look like
/// `Alex                en_US    # Most people recognize me by my voice.`
/// An exact locale match wins over a match on the primary subtag.
fn say_voice_for(listing: &str, language: &str) -> Option<String> {
    let voices: Vec<(&str, String)> = listing
        .lines()
        .filter_map(|line| {
            let spec = line.split('#').next()?.trim_end();
            let (name, locale) = spec.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name, locale.replace('_', "-")))
        })
        .collect();
    voices
        .iter()
        .find(|(_, locale)| locale.eq_ignore_ascii_case(language))
        .or_else(|| {
            voices.iter().find(|(_, locale)| {
                primary_subtag(locale).eq_ignore_ascii_case(primary_subtag(language))
            })
        })
        .map(|(name, _)| name.to_string())
}

fn list_say_voices() -> Option<String> {
    let output = Command::new("say")
        .args(["-v", "?"])
        .stderr(Stdio::null())
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Speaks by spawning the platform's speech command.
#[derive(Debug)]
pub struct SystemSpeaker {
    backend: Option<Backend>,
    child: Option<Child>,
    /// `say` voices resolved per language tag.
    voices: HashMap<String, Option<String>>,
}

impl SystemSpeaker {
    pub fn detect() -> Self {
        let backend = Backend::detect();
        match backend {
            Some(b) => tracing::debug!("Speech backend: {}", b.binary_name()),
            None => tracing::debug!("No speech backend found, narration disabled"),
        }
        Self {
            backend,
            child: None,
            voices: HashMap::new(),
        }
    }

    fn voice(&mut self, language: &str) -> Option<String> {
        if self.backend != Some(Backend::Say) {
            return None;
        }
        self.voices
            .entry(language.to_string())
            .or_insert_with(|| {
                let voice = list_say_voices().and_then(|l| say_voice_for(&l, language));
                match &voice {
                    Some(v) => tracing::debug!("Using voice {v} for {language}"),
                    None => tracing::debug!("No voice for {language}, using system default"),
                }
                voice
            })
            .clone()
    }
}

impl Speaker for SystemSpeaker {
    fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    fn speak(&mut self, text: &str, language: &str) -> Result<()> {
        let Some(backend) = self.backend else {
            return Ok(());
        };
        let voice = self.voice(language);
        let child = backend
            .command(text, language, voice.as_deref())
            .spawn()
            .with_context(|| format!("Failed to start {}", backend.binary_name()))?;
        self.child = Some(child);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(mut child) = self.child.take() {
            // Already finished is fine.
            let _ = child.kill();
            let _ = child.wait();
        }
        if self.backend == Some(Backend::SpdSay) {
            // spd-say hands the text to a daemon, so killing the client is
            // not enough.
            let _ = Command::new("spd-say")
                .arg("--cancel")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }
}

impl Drop for SystemSpeaker {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Gatekeeper in front of a [`Speaker`]: one utterance at a time, failures
/// logged and swallowed.
pub struct Narrator {
    speaker: Box<dyn Speaker>,
    language: String,
}

impl Narrator {
    pub fn new(speaker: Box<dyn Speaker>, language: impl Into<String>) -> Self {
        Self {
            speaker,
            language: language.into(),
        }
    }

    pub fn narrate(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() || !self.speaker.is_available() {
            return;
        }
        self.speaker.cancel();
        if let Err(e) = self.speaker.speak(text, &self.language) {
            tracing::warn!("Narration failed: {e:#}");
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingSpeaker};
    use super::*;

    #[test]
    fn test_narrate_cancels_then_speaks() {
        let speaker = RecordingSpeaker::default();
        let mut narrator = Narrator::new(Box::new(speaker.clone()), DEFAULT_LANGUAGE);
        narrator.narrate("Keyboard");
        narrator.narrate("Mouse");
        assert_eq!(
            *speaker.calls.borrow(),
            vec![
                Call::Cancel,
                Call::Speak("Keyboard".into(), "en-US".into()),
                Call::Cancel,
                Call::Speak("Mouse".into(), "en-US".into()),
            ]
        );
    }

    #[test]
    fn test_unavailable_is_silent() {
        let speaker = RecordingSpeaker {
            unavailable: true,
            ..Default::default()
        };
        let mut narrator = Narrator::new(Box::new(speaker.clone()), DEFAULT_LANGUAGE);
        narrator.narrate("Anything");
        assert!(speaker.calls.borrow().is_empty());
    }

    #[test]
    fn test_failures_are_swallowed() {
        let speaker = RecordingSpeaker {
            failing: true,
            ..Default::default()
        };
        let mut narrator = Narrator::new(Box::new(speaker.clone()), DEFAULT_LANGUAGE);
        narrator.narrate("Scanner");
        narrator.narrate("Webcam");
        assert_eq!(speaker.spoken(), vec!["Scanner", "Webcam"]);
    }

    #[test]
    fn test_blank_text_is_skipped() {
        let speaker = RecordingSpeaker::default();
        let mut narrator = Narrator::new(Box::new(speaker.clone()), DEFAULT_LANGUAGE);
        narrator.narrate("   ");
        assert!(speaker.calls.borrow().is_empty());
    }

    #[test]
    fn test_primary_subtag() {
        assert_eq!(primary_subtag("en-US"), "en");
        assert_eq!(primary_subtag("pt_BR"), "pt");
        assert_eq!(primary_subtag("de"), "de");
    }

    #[test]
    fn test_backend_arguments() {
        let cmd = Backend::EspeakNg.command("-dash first", "en-US", None);
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-v", "en-us", " -dash first"]);

        let cmd = Backend::PowerShell.command("Hello", "en-US", None);
        let env: Vec<_> = cmd.get_envs().collect();
        assert!(env.iter().any(|(k, v)| *k == TEXT_ENV && v.is_some_and(|v| v == "Hello")));
    }

    #[test]
    fn test_say_passes_voice() {
        let cmd = Backend::Say.command("Hello", "sv-SE", Some("Alva"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-v", "Alva", "Hello"]);

        let cmd = Backend::Say.command("Hello", "sv-SE", None);
        assert_eq!(cmd.get_args().count(), 1);
    }

    #[test]
    fn test_say_voice_for_language() {
        let listing = "\
Alex                en_US    # Most people recognize me by my voice.
Alva                sv_SE    # Hej, jag heter Alva.
Daniel              en_GB    # Hello, my name is Daniel.
Eddy (German (Germany)) de_DE    # Hallo! Ich heiße Eddy.
";
        assert_eq!(say_voice_for(listing, "en-US").as_deref(), Some("Alex"));
        assert_eq!(say_voice_for(listing, "en-GB").as_deref(), Some("Daniel"));
        assert_eq!(say_voice_for(listing, "sv-se").as_deref(), Some("Alva"));
        assert_eq!(
            say_voice_for(listing, "de-AT").as_deref(),
            Some("Eddy (German (Germany))")
        );
        assert_eq!(say_voice_for(listing, "fr-FR"), None);
        assert_eq!(say_voice_for("", "en-US"), None);
    }
}
