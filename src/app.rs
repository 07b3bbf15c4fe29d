//! Main application module for the avatar loop.
//!
//! [`AvatarApp`] drives one synchronous iteration per captured frame:
//! acquire, infer, composite, record, present, then poll for a single key.
//! Capture, presentation and video encoding sit behind [`FrameSource`],
//! [`Presenter`] and [`SinkFactory`] so that the same loop runs against an
//! OpenCV window or fully headless.

use crate::{
    canvas::{Canvas, Color, Point},
    compositor::Compositor,
    config::{Config, KeyConfig},
    landmarks::{LandmarkFrame, PerceptionRequest, SegmentationMask},
    recording::{SinkFactory, VideoSink},
    session::{Command, Session},
    style::AvatarStyle,
    Result,
};
use log::{debug, info, warn};
use std::io::{BufRead, Write};
use std::time::Instant;

/// One captured frame together with what the detectors found in it
#[derive(Debug, Clone)]
pub struct FrameInput<F> {
    pub frame: F,
    pub landmarks: LandmarkFrame,
}

/// Produces frames and their landmarks; the only blocking stage of the loop
pub trait FrameSource {
    type Frame;

    /// Block until the next frame is available
    ///
    /// Returns `Ok(None)` when no frame could be read, which ends the loop.
    fn acquire(&mut self, request: &PerceptionRequest) -> Result<Option<FrameInput<Self::Frame>>>;
}

/// Background replacement applied to the preview
#[derive(Debug, Clone, Copy)]
pub struct BackgroundFill<'a> {
    pub mask: &'a SegmentationMask,
    pub color: Color,
    pub threshold: f32,
}

/// Where the webcam preview goes on the canvas
#[derive(Debug, Clone, Copy)]
pub struct PreviewPlacement<'a> {
    pub origin: Point,
    pub width: u32,
    pub height: u32,
    pub background: Option<BackgroundFill<'a>>,
}

/// Creates canvases, shows them and reports key presses
pub trait Presenter {
    type Frame;
    type Canvas: Canvas;

    fn new_canvas(&mut self, width: u32, height: u32) -> Result<Self::Canvas>;

    /// Copy the (optionally background-replaced) source frame into the preview area
    fn place_preview(
        &mut self,
        canvas: &mut Self::Canvas,
        frame: &mut Self::Frame,
        placement: &PreviewPlacement<'_>,
    ) -> Result<()>;

    fn show(&mut self, canvas: &Self::Canvas) -> Result<()>;

    /// Non-blocking check for a pressed key
    fn poll_key(&mut self) -> Result<Option<char>>;
}

/// Main application struct
pub struct AvatarApp<Src, P, F>
where
    F: SinkFactory,
{
    source: Src,
    presenter: P,
    factory: F,
    session: Session<F::Sink>,
    compositor: Compositor,
    frames: u64,
}

impl<Src, P, F> AvatarApp<Src, P, F>
where
    Src: FrameSource,
    P: Presenter<Frame = Src::Frame>,
    F: SinkFactory,
    F::Sink: VideoSink<Canvas = P::Canvas>,
{
    /// Create a new avatar application
    #[must_use]
    pub fn new(config: Config, style: AvatarStyle, source: Src, presenter: P, factory: F) -> Self {
        info!("Initializing avatar application");
        Self {
            compositor: Compositor::new(&config),
            session: Session::new(config, style),
            source,
            presenter,
            factory,
            frames: 0,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session<F::Sink> {
        &self.session
    }

    #[must_use]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Frames processed so far
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Apply a command as if its key had been pressed
    ///
    /// # Errors
    ///
    /// Returns an error if starting or stopping a recording fails
    pub fn apply(&mut self, command: Command) -> Result<()> {
        let config = self.session.config();
        let canvas_size = (config.canvas.width, config.canvas.height);
        self.session.handle_command(command, &mut self.factory, canvas_size)
    }

    /// Run until quit or until the source runs dry
    ///
    /// Any active recording is finalized on every exit path.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a stage of the loop, or by
    /// finalizing the recording
    pub fn run(&mut self) -> Result<u64> {
        info!("Starting main application loop");

        let result = self.run_loop();
        let shutdown = self.session.shutdown();

        info!("Application shutting down after {} frames", self.frames);
        result?;
        shutdown?;
        Ok(self.frames)
    }

    fn run_loop(&mut self) -> Result<()> {
        while self.session.is_running() {
            let started = Instant::now();

            let request = self.session.perception_request();
            let Some(input) = self.source.acquire(&request)? else {
                info!("No more frames from source");
                break;
            };

            self.step(input)?;
            self.session.finish_frame(started.elapsed());
        }
        Ok(())
    }

    /// Process one frame: update, draw, record, show, then poll one key
    ///
    /// # Errors
    ///
    /// Returns an error if drawing, recording or presenting fails
    pub fn step(&mut self, input: FrameInput<Src::Frame>) -> Result<()> {
        let FrameInput { mut frame, landmarks } = input;
        let landmarks = landmarks.restricted_to(self.session.perception_request());

        self.session.update(&landmarks);
        let canvas = self.render(&mut frame, &landmarks)?;

        self.session.record_frame(&canvas)?;
        self.presenter.show(&canvas)?;
        self.frames += 1;

        if let Some(key) = self.presenter.poll_key()? {
            match Command::from_key(key, &self.session.config().keys) {
                Some(command) => {
                    if let Err(e) = self.apply(command) {
                        warn!("Command {command:?} failed: {e}");
                    }
                }
                None => debug!("Unbound key '{key}'"),
            }
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Src::Frame, landmarks: &LandmarkFrame) -> Result<P::Canvas> {
        let config = self.session.config();
        let toggles = self.session.toggles();
        let mut canvas = self.presenter.new_canvas(config.canvas.width, config.canvas.height)?;

        self.compositor
            .draw_avatar(&mut canvas, self.session.state(), &self.session.palette())?;

        let background = match (&landmarks.segmentation, toggles.background_removal) {
            (Some(mask), true) => Some(BackgroundFill {
                mask,
                color: config.background.color,
                threshold: config.background.mask_threshold,
            }),
            _ => None,
        };
        let (origin, _) = self.compositor.preview_rect();
        let placement = PreviewPlacement {
            origin,
            width: config.preview.width,
            height: config.preview.height,
            background,
        };
        self.presenter.place_preview(&mut canvas, frame, &placement)?;
        self.compositor.draw_preview_border(&mut canvas)?;

        if toggles.show_mesh {
            self.compositor.draw_landmark_overlay(&mut canvas, landmarks)?;
        }

        self.compositor.draw_status(&mut canvas, &self.session.status())?;
        if toggles.show_debug {
            self.compositor
                .draw_debug(&mut canvas, self.session.state(), self.session.fps())?;
        }

        Ok(canvas)
    }
}

/// Log the key bindings once at startup
pub fn log_controls(keys: &KeyConfig) {
    info!("Controls:");
    info!("  {}: Quit", keys.quit.to_ascii_uppercase());
    info!("  {}: Toggle face mesh display", keys.toggle_mesh.to_ascii_uppercase());
    info!("  {}: Toggle hand tracking", keys.toggle_hands.to_ascii_uppercase());
    info!("  {}: Toggle background removal", keys.toggle_background.to_ascii_uppercase());
    info!("  {}: Start/Stop recording", keys.toggle_record.to_ascii_uppercase());
    for (key, style) in keys.styles.iter().zip(AvatarStyle::ALL) {
        info!("  {key}: {} style", style.title());
    }
}

/// Ask for the initial style on `output` and read one answer from `input`
///
/// Empty, invalid or missing answers select `default`.
///
/// # Errors
///
/// Returns an error if writing the menu or reading the answer fails
pub fn prompt_style<R: BufRead, W: Write>(input: &mut R, output: &mut W, default: AvatarStyle) -> Result<AvatarStyle> {
    writeln!(output, "Select avatar style:")?;
    for (choice, style) in (1..).zip(AvatarStyle::ALL) {
        writeln!(output, "  {choice}. {} ({})", style.title(), style.description())?;
    }
    write!(output, "Enter choice (1-4) [default: {}]: ", style_choice(default))?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;

    let style = AvatarStyle::from_menu_choice(&answer, default);
    info!("Selected style: {}", style.title());
    Ok(style)
}

fn style_choice(style: AvatarStyle) -> usize {
    AvatarStyle::ALL
        .iter()
        .position(|candidate| *candidate == style)
        .map_or(1, |index| index + 1)
}
