use std::{path::PathBuf, str::FromStr};

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use uuid::Uuid;

use crate::editor::{EditorError, Field, SegmentUpdate, SessionEditor};
use crate::models::Session;

const CUSTOM_SESSION_NAME: &str = "Sesión personalizada";

#[derive(Parser, Debug)]
#[command(author, version, about = "Treadmill interval session timer", long_about = None)]
pub struct Cli {
    /// JSON settings file
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in sessions
    List,
    /// Print a session plan without running it
    Show(SessionArgs),
    /// Run a session as a live countdown
    Run(RunArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    /// Start from this preset (see `list`)
    #[arg(long)]
    pub preset: Option<String>,

    /// Display name for the session
    #[arg(long)]
    pub name: Option<String>,

    /// Extra segment as `MM:SS,SPEED,INCLINE` or `SECS,SPEED,INCLINE`; repeatable.
    /// Without `--preset` these make up the whole session.
    #[arg(long = "segment", value_name = "SPEC")]
    pub segments: Vec<SegmentSpec>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Print events as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Tick length in milliseconds (overrides settings)
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Do not ring the terminal bell near segment end
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_bell: bool,
}

/// Segment fields exactly as typed. Each part goes through the editor's
/// field rules, so bad values clamp instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSpec {
    pub duration: SegmentDuration,
    pub speed: String,
    pub incline: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SegmentDuration {
    /// `MM:SS`, or anything that is not a plain number of seconds.
    Clock { minutes: String, seconds: String },
    Seconds(u32),
}

impl FromStr for SegmentSpec {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = input.split(',').map(str::trim).collect();
        let [duration, speed, incline] = parts.as_slice() else {
            return Err(format!(
                "expected DURATION,SPEED,INCLINE but got `{input}`"
            ));
        };

        let duration = match duration.split_once(':') {
            Some((minutes, seconds)) => SegmentDuration::Clock {
                minutes: minutes.to_string(),
                seconds: seconds.to_string(),
            },
            None => match duration.parse::<u32>() {
                Ok(total) => SegmentDuration::Seconds(total),
                Err(_) => SegmentDuration::Clock {
                    minutes: duration.to_string(),
                    seconds: String::new(),
                },
            },
        };

        Ok(Self {
            duration,
            speed: speed.to_string(),
            incline: incline.to_string(),
        })
    }
}

impl SegmentSpec {
    pub fn apply(&self, editor: &mut SessionEditor, id: &str) -> Result<(), EditorError> {
        match &self.duration {
            SegmentDuration::Clock { minutes, seconds } => {
                editor.enter_text(id, Field::Minutes, minutes)?;
                editor.enter_text(id, Field::Seconds, seconds)?;
            }
            SegmentDuration::Seconds(total) => {
                editor.update_segment(id, &SegmentUpdate::duration_secs(*total))?;
            }
        }
        editor.enter_text(id, Field::Speed, &self.speed)?;
        editor.enter_text(id, Field::Incline, &self.incline)
    }
}

/// Builds the working session the way the setup screen would: pick a
/// preset, append segments, rename.
pub fn build_editor(args: &SessionArgs) -> Result<SessionEditor> {
    let mut editor = match (&args.preset, args.segments.is_empty()) {
        (Some(preset), _) => {
            let mut editor = SessionEditor::default();
            editor.load_preset(preset)?;
            editor
        }
        (None, false) => SessionEditor::new(Session::new(
            Uuid::new_v4().to_string(),
            CUSTOM_SESSION_NAME,
            Vec::new(),
        )),
        (None, true) => SessionEditor::default(),
    };

    for spec in &args.segments {
        let id = editor.add_segment();
        spec.apply(&mut editor, &id)?;
    }

    if let Some(name) = &args.name {
        editor.rename(name.clone());
    }

    Ok(editor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{BASIC_WARMUP, HIIT_GONZALO};

    fn spec(input: &str) -> SegmentSpec {
        input.parse().unwrap()
    }

    #[test]
    fn parses_clock_form() {
        assert_eq!(
            spec("1:30, 4.5, 8"),
            SegmentSpec {
                duration: SegmentDuration::Clock {
                    minutes: "1".into(),
                    seconds: "30".into(),
                },
                speed: "4.5".into(),
                incline: "8".into(),
            }
        );
    }

    #[test]
    fn parses_seconds_form() {
        assert_eq!(spec("95,3,0").duration, SegmentDuration::Seconds(95));
    }

    #[test]
    fn seconds_form_splits_and_clamps_through_the_editor() {
        let args = SessionArgs {
            segments: vec![spec("95,3,0"), spec("7200,3,0")],
            ..SessionArgs::default()
        };
        let editor = build_editor(&args).unwrap();
        let segments = &editor.session().segments;

        assert_eq!(segments[0].minutes_and_seconds(), (1, 35));
        assert_eq!(segments[1].duration_secs, 99 * 60);
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!("1:00,3".parse::<SegmentSpec>().is_err());
        assert!("1:00,3,0,9".parse::<SegmentSpec>().is_err());
    }

    #[test]
    fn custom_segments_build_a_fresh_session() {
        let args = SessionArgs {
            segments: vec![spec("0:45,5,2"), spec("2:00,20,x"), spec("junk,4,1")],
            ..SessionArgs::default()
        };
        let editor = build_editor(&args).unwrap();
        let segments = &editor.session().segments;

        assert_eq!(editor.session().name, CUSTOM_SESSION_NAME);
        assert_eq!(segments.len(), 3);
        assert_eq!((segments[0].duration_secs, segments[0].speed), (45, 5.0));
        assert_eq!(segments[1].speed, 15.0);
        assert_eq!(segments[1].incline, 0.0);
        assert_eq!(segments[2].duration_secs, 0);
    }

    #[test]
    fn preset_with_extra_segments_appends() {
        let args = SessionArgs {
            preset: Some(BASIC_WARMUP.into()),
            name: Some("Tuesday".into()),
            segments: vec![spec("3:00,7,1")],
        };
        let editor = build_editor(&args).unwrap();

        assert_eq!(editor.session().name, "Tuesday");
        assert_eq!(editor.session().segments.len(), 6);
        assert_eq!(editor.session().segments[5].duration_secs, 180);
    }

    #[test]
    fn defaults_to_first_preset() {
        let editor = build_editor(&SessionArgs::default()).unwrap();
        assert_eq!(editor.session().id, HIIT_GONZALO);
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let args = SessionArgs {
            preset: Some("nope".into()),
            ..SessionArgs::default()
        };
        assert!(build_editor(&args).is_err());
    }

    #[test]
    fn too_few_custom_segments_fail_validation() {
        let args = SessionArgs {
            segments: vec![spec("1:00,3,0"); 4],
            ..SessionArgs::default()
        };
        let editor = build_editor(&args).unwrap();
        assert!(editor.validate_for_playback().is_err());
    }

    #[test]
    fn clap_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::parse_from([
            "treadmill",
            "run",
            "--preset",
            "basic-warmup",
            "--segment",
            "1:00,3,0",
            "--tick-ms",
            "250",
            "--json",
        ]);
        match cli.command {
            Command::Run(run) => {
                assert_eq!(run.session.preset.as_deref(), Some("basic-warmup"));
                assert_eq!(run.session.segments.len(), 1);
                assert_eq!(run.tick_ms, Some(250));
                assert!(run.json);
                assert!(!run.no_bell);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
