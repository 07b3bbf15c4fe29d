//! Webcam, window and video file backend built on `OpenCV`.

use crate::{
    app::{FrameInput, FrameSource, PreviewPlacement, Presenter},
    canvas::{Canvas, Color, EllipseArc, Point, Stroke},
    landmarks::{LandmarkFrame, PerceptionRequest},
    perception::JsonLinesFeed,
    recording::{RecordingSpec, SinkFactory, VideoSink},
    utils::{
        replace_background,
        safe_cast::{dim_to_i32, i32_to_dim},
    },
    Error, Result,
};
use log::{error, info, warn};
use opencv::{
    core::{self, Mat, Rect, Scalar, Size, Vector, CV_8UC3},
    highgui::{self, WINDOW_AUTOSIZE},
    imgproc::{self, InterpolationFlags, FILLED, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter, CAP_PROP_BUFFERSIZE},
};
use std::io::BufRead;
use std::path::Path;

/// Window title of the avatar view
pub const WINDOW_NAME: &str = "VTuber Avatar";

fn scalar(color: Color) -> Scalar {
    Scalar::new(f64::from(color.b), f64::from(color.g), f64::from(color.r), 0.0)
}

fn cv_point(point: Point) -> core::Point {
    core::Point::new(point.x, point.y)
}

fn thickness(stroke: Stroke) -> i32 {
    match stroke {
        Stroke::Filled => FILLED,
        Stroke::Outline(width) => width,
    }
}

/// Webcam frames paired with landmarks from an external feed
pub struct CameraSource<R> {
    capture: VideoCapture,
    feed: Option<JsonLinesFeed<R>>,
    mirror: bool,
}

impl<R: BufRead> CameraSource<R> {
    /// Open a camera by index
    ///
    /// Without a feed every frame is processed as having no detections.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera cannot be opened
    pub fn open(index: i32, feed: Option<JsonLinesFeed<R>>, mirror: bool) -> Result<Self> {
        info!("Opening camera {index}");
        let mut capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(Error::CaptureError(format!("Could not open webcam {index}")));
        }

        // Reduce buffer size for lower latency
        capture.set(CAP_PROP_BUFFERSIZE, 1.0)?;

        if feed.is_none() {
            warn!("No landmark feed given; the avatar will not follow the camera");
        }

        Ok(Self { capture, feed, mirror })
    }
}

impl<R: BufRead> FrameSource for CameraSource<R> {
    type Frame = Mat;

    fn acquire(&mut self, request: &PerceptionRequest) -> Result<Option<FrameInput<Mat>>> {
        let mut raw = Mat::default();
        if !self.capture.read(&mut raw)? || raw.empty() {
            error!("Could not read frame");
            return Ok(None);
        }

        let frame = if self.mirror {
            let mut flipped = Mat::default();
            core::flip(&raw, &mut flipped, 1)?;
            flipped
        } else {
            raw
        };

        let width = i32_to_dim(frame.cols())?;
        let height = i32_to_dim(frame.rows())?;
        let landmarks = match self.feed.as_mut() {
            Some(feed) => feed.next_frame()?.unwrap_or_else(|| {
                info!("Landmark feed ended; continuing without detections");
                LandmarkFrame::default()
            }),
            None => LandmarkFrame::default(),
        };

        Ok(Some(FrameInput {
            frame,
            landmarks: landmarks.with_default_dimensions(width, height).restricted_to(*request),
        }))
    }
}

/// Canvas backed by an 8-bit, 3-channel `Mat`
pub struct MatCanvas(pub Mat);

impl MatCanvas {
    /// # Errors
    ///
    /// Returns an error if the matrix cannot be allocated
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let mat = Mat::new_rows_cols_with_default(dim_to_i32(height), dim_to_i32(width), CV_8UC3, Scalar::all(0.0))?;
        Ok(Self(mat))
    }
}

impl Canvas for MatCanvas {
    fn size(&self) -> (u32, u32) {
        (
            u32::try_from(self.0.cols()).unwrap_or(0),
            u32::try_from(self.0.rows()).unwrap_or(0),
        )
    }

    fn fill(&mut self, color: Color) -> Result<()> {
        self.0.set_to(&scalar(color), &core::no_array())?;
        Ok(())
    }

    fn circle(&mut self, center: Point, radius: i32, color: Color, stroke: Stroke) -> Result<()> {
        imgproc::circle(&mut self.0, cv_point(center), radius, scalar(color), thickness(stroke), LINE_8, 0)?;
        Ok(())
    }

    fn ellipse(&mut self, arc: EllipseArc, color: Color, stroke: Stroke) -> Result<()> {
        imgproc::ellipse(
            &mut self.0,
            cv_point(arc.center),
            Size::new(arc.axes.0, arc.axes.1),
            arc.rotation,
            arc.start_angle,
            arc.end_angle,
            scalar(color),
            thickness(stroke),
            LINE_8,
            0,
        )?;
        Ok(())
    }

    fn line(&mut self, from: Point, to: Point, color: Color, thickness: i32) -> Result<()> {
        imgproc::line(&mut self.0, cv_point(from), cv_point(to), scalar(color), thickness, LINE_8, 0)?;
        Ok(())
    }

    fn polyline(&mut self, points: &[Point], closed: bool, color: Color, thickness: i32) -> Result<()> {
        let contour: Vector<core::Point> = points.iter().copied().map(cv_point).collect();
        let contours: Vector<Vector<core::Point>> = std::iter::once(contour).collect();
        imgproc::polylines(&mut self.0, &contours, closed, scalar(color), thickness, LINE_8, 0)?;
        Ok(())
    }

    fn rectangle(&mut self, top_left: Point, bottom_right: Point, color: Color, stroke: Stroke) -> Result<()> {
        let rect = Rect::new(
            top_left.x,
            top_left.y,
            bottom_right.x - top_left.x,
            bottom_right.y - top_left.y,
        );
        imgproc::rectangle(&mut self.0, rect, scalar(color), thickness(stroke), LINE_8, 0)?;
        Ok(())
    }

    fn text(&mut self, text: &str, origin: Point, scale: f64, color: Color, thickness: i32) -> Result<()> {
        imgproc::put_text(
            &mut self.0,
            text,
            cv_point(origin),
            FONT_HERSHEY_SIMPLEX,
            scale,
            scalar(color),
            thickness,
            LINE_8,
            false,
        )?;
        Ok(())
    }
}

/// Shows the canvas in a highgui window and polls its keyboard
pub struct WindowPresenter {
    window: String,
}

impl WindowPresenter {
    /// # Errors
    ///
    /// Returns an error if the window cannot be created
    pub fn new(window: &str) -> Result<Self> {
        highgui::named_window(window, WINDOW_AUTOSIZE)?;
        Ok(Self {
            window: window.to_string(),
        })
    }
}

impl Presenter for WindowPresenter {
    type Frame = Mat;
    type Canvas = MatCanvas;

    fn new_canvas(&mut self, width: u32, height: u32) -> Result<MatCanvas> {
        MatCanvas::new(width, height)
    }

    fn place_preview(&mut self, canvas: &mut MatCanvas, frame: &mut Mat, placement: &PreviewPlacement<'_>) -> Result<()> {
        let width = dim_to_i32(placement.width);
        let height = dim_to_i32(placement.height);

        let mut small = Mat::default();
        imgproc::resize(
            &*frame,
            &mut small,
            Size::new(width, height),
            0.0,
            0.0,
            InterpolationFlags::INTER_LINEAR as i32,
        )?;

        if let Some(fill) = placement.background {
            let pixels = small.data_bytes_mut()?;
            replace_background(pixels, placement.width, placement.height, fill.mask, fill.threshold, fill.color)?;
        }

        let mut roi = canvas
            .0
            .roi_mut(Rect::new(placement.origin.x, placement.origin.y, width, height))?;
        small.copy_to(&mut roi)?;
        Ok(())
    }

    fn show(&mut self, canvas: &MatCanvas) -> Result<()> {
        highgui::imshow(&self.window, &canvas.0)?;
        Ok(())
    }

    fn poll_key(&mut self) -> Result<Option<char>> {
        let key = highgui::wait_key(1)?;
        if key < 0 {
            return Ok(None);
        }
        Ok(u8::try_from(key & 0xFF).ok().map(char::from))
    }
}

impl Drop for WindowPresenter {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.window) {
            warn!("Failed to close window: {e}");
        }
    }
}

/// Opens `VideoWriter`s with the configured codec and frame rate
#[derive(Debug, Default)]
pub struct VideoFileFactory;

impl SinkFactory for VideoFileFactory {
    type Sink = VideoFileSink;

    fn open(&mut self, path: &Path, spec: &RecordingSpec) -> Result<VideoFileSink> {
        let [c1, c2, c3, c4] = spec.codec;
        let fourcc = VideoWriter::fourcc(c1, c2, c3, c4)?;
        let filename = path.to_string_lossy();
        let size = Size::new(dim_to_i32(spec.width), dim_to_i32(spec.height));

        let writer = VideoWriter::new(&filename, fourcc, spec.fps, size, true)?;
        if !writer.is_opened()? {
            return Err(Error::RecordingError(format!("Could not open video writer for {filename}")));
        }
        Ok(VideoFileSink { writer })
    }
}

/// Encodes canvases into a video file
pub struct VideoFileSink {
    writer: VideoWriter,
}

impl VideoSink for VideoFileSink {
    type Canvas = MatCanvas;

    fn write_frame(&mut self, canvas: &MatCanvas) -> Result<()> {
        self.writer.write(&canvas.0)?;
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.writer.release()?;
        Ok(())
    }
}
