//! Landmark-driven 2D avatar for live streaming.
//!
//! This library turns per-frame face and hand landmarks, produced by an
//! external perception process, into a procedurally drawn avatar:
//! - Geometric features (eye and mouth aspect ratios, head pose)
//! - Rule-based emotion and hand gesture classification
//! - A stateful compositor drawing through a backend-neutral [`canvas::Canvas`]
//! - A session controller with FPS accounting, recording and key commands
//!
//! The pipeline for one frame is:
//! 1. [`landmarks::LandmarkFrame`] arrives from the feed
//! 2. [`features`] measures the face, [`emotion`] and [`gesture`] classify it
//! 3. [`session::Session`] merges the results into [`state::AvatarState`]
//! 4. [`compositor::Compositor`] draws the avatar and overlays
//!
//! # Examples
//!
//! ## Drawing One Frame
//!
//! ```
//! use vtuber_avatar::{
//!     canvas::DrawList,
//!     compositor::Compositor,
//!     config::Config,
//!     landmarks::LandmarkFrame,
//!     recording::VideoSink,
//!     session::Session,
//!     style::AvatarStyle,
//! };
//!
//! # struct NoSink;
//! # impl VideoSink for NoSink {
//! #     type Canvas = DrawList;
//! #     fn write_frame(&mut self, _: &DrawList) -> vtuber_avatar::Result<()> { Ok(()) }
//! #     fn finalize(&mut self) -> vtuber_avatar::Result<()> { Ok(()) }
//! # }
//! # fn main() -> vtuber_avatar::Result<()> {
//! let config = Config::default();
//! let compositor = Compositor::new(&config);
//! let mut session: Session<NoSink> = Session::new(config, AvatarStyle::Anime);
//!
//! // A frame without detections keeps the neutral starting pose
//! session.update(&LandmarkFrame::empty(640, 480));
//!
//! let mut canvas = DrawList::new(1280, 720);
//! compositor.draw_avatar(&mut canvas, session.state(), &session.palette())?;
//! compositor.draw_status(&mut canvas, &session.status())?;
//! assert!(canvas.contains_text("No Face"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Classifying A Hand
//!
//! ```
//! use vtuber_avatar::gesture::{classify_fingers, FingerExtension, Gesture};
//!
//! let fingers = FingerExtension { index: true, middle: true, ring: false, pinky: false };
//! assert_eq!(classify_fingers(&fingers), Gesture::Peace);
//! ```

/// Per-frame landmark data model
pub mod landmarks;

/// Geometric feature extraction from face landmarks
pub mod features;

/// Rule-based emotion classification
pub mod emotion;

/// Rule-based hand gesture classification
pub mod gesture;

/// Persistent avatar state with latching and resetting fields
pub mod state;

/// Avatar styles and color palettes
pub mod style;

/// Drawing surface abstraction
pub mod canvas;

/// Procedural avatar rendering
pub mod compositor;

/// Rolling frame rate estimate
pub mod fps;

/// Recording state machine and video sink traits
pub mod recording;

/// Session controller for commands and per-frame updates
pub mod session;

/// Landmark feed from an external perception process
pub mod perception;

/// Main application loop
pub mod app;

/// Display-free backend
pub mod headless;

/// `OpenCV` webcam, window and video writer backend
#[cfg(feature = "opencv")]
pub mod opencv_backend;

/// Utility functions for pixel buffers and coordinate conversions
pub mod utils;

/// Error types and result handling
pub mod error;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
