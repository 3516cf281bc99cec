//! ffmpeg/ffprobe subprocess backend.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use proxygen_common::error::{ProxyError, ProxygenResult};
use proxygen_processing_core::metadata::{EmbeddedMetadata, EmbeddedTags};
use serde::Deserialize;

use crate::codec::{MediaCodec, MediaInfo, RenderRequest};
use crate::compositor::{build_filter_graph, TITLE_TEXT_FILE};

/// Time without progress before a render is reported as stalled.
const STALL_WARNING: Duration = Duration::from_secs(10);

/// Codec backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegCodec {
    /// Use `ffmpeg`/`ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self::with_binaries("ffmpeg", "ffprobe")
    }

    /// Use explicit binary paths.
    pub fn with_binaries(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Embedded tag reader sharing this codec's ffprobe binary.
    pub fn tag_reader(&self) -> FfprobeTags {
        FfprobeTags {
            ffprobe: self.ffprobe.clone(),
        }
    }

    fn build_args(&self, request: &RenderRequest) -> Vec<OsString> {
        let filter = build_filter_graph(
            request.width,
            request.height,
            request.duration_secs,
            &request.overlay,
        );
        let args: Vec<OsString> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-nostats".into(),
            "-progress".into(),
            "pipe:1".into(),
            "-ss".into(),
            format!("{:.6}", request.start_secs).into(),
            "-i".into(),
            request.source.clone().into_os_string(),
            "-filter_complex".into(),
            filter.into(),
            "-map".into(),
            "[vout]".into(),
            "-map".into(),
            "0:a?".into(),
            // Pad short audio with silence; -t then cuts both streams to the window.
            "-af".into(),
            "apad".into(),
            "-t".into(),
            format!("{:.6}", request.duration_secs).into(),
            "-c:v".into(),
            request.options.video_codec.clone().into(),
            "-preset".into(),
            request.options.preset.clone().into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-c:a".into(),
            request.options.audio_codec.clone().into(),
            "-movflags".into(),
            "+faststart".into(),
            "-f".into(),
            "mp4".into(),
            request.output_path.clone().into_os_string(),
        ];
        args
    }

    fn run_ffmpeg(
        &self,
        args: &[OsString],
        workdir: &Path,
        expected_secs: f64,
    ) -> ProxygenResult<()> {
        tracing::debug!(args = ?args, "Running ffmpeg");
        let mut child = Command::new(&self.ffmpeg)
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProxyError::render(format!("Failed to start ffmpeg: {e}")))?;

        let start = Instant::now();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProxyError::render("Failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProxyError::render("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently to avoid ffmpeg blocking on a full stderr pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        // The watchdog fires even while ffmpeg writes nothing at all.
        let (ticks, tick_rx) = mpsc::channel::<f64>();
        std::thread::spawn(move || watch_for_stalls(tick_rx, STALL_WARNING));

        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let mut progress = ProgressState::default();
        let mut last_progress_secs = 0.0f64;
        loop {
            line.clear();
            let bytes = reader
                .read_line(&mut line)
                .map_err(|e| ProxyError::render(format!("Failed reading ffmpeg progress: {e}")))?;
            if bytes == 0 {
                break;
            }

            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            progress.update(key, value);
            if key != "progress" {
                continue;
            }

            if progress.out_time_secs > last_progress_secs + 0.001 {
                last_progress_secs = progress.out_time_secs;
                let _ = ticks.send(last_progress_secs);
                tracing::trace!(
                    fraction = progress.fraction(expected_secs),
                    "ffmpeg progress"
                );
            }
        }
        drop(ticks);

        let status = child
            .wait()
            .map_err(|e| ProxyError::render(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = stderr_task
            .join()
            .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

        if !status.success() {
            return Err(ProxyError::render(format!(
                "ffmpeg failed ({status}): {}",
                stderr_output.trim()
            )));
        }

        tracing::debug!(
            elapsed_secs = start.elapsed().as_secs_f64(),
            complete = progress.complete,
            "ffmpeg finished"
        );
        Ok(())
    }
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaCodec for FfmpegCodec {
    fn probe(&self, path: &Path) -> ProxygenResult<MediaInfo> {
        let output = run_ffprobe(
            &self.ffprobe,
            &[
                "-select_streams",
                "v:0",
                "-show_entries",
                "format=duration:stream=width,height:stream_side_data=rotation:stream_tags=rotate",
            ],
            path,
        )?;
        parse_probe_output(&output)
    }

    fn render(&self, request: &RenderRequest) -> ProxygenResult<()> {
        // ffmpeg runs inside the workspace, so every path it sees must be absolute.
        let cwd = std::env::current_dir()?;
        let mut request = request.clone();
        request.source = cwd.join(&request.source);
        request.output_path = cwd.join(&request.output_path);

        if !request.source.exists() {
            return Err(ProxyError::FileNotFound {
                path: request.source.clone(),
            });
        }

        let workspace = tempfile::Builder::new()
            .prefix("proxygen-render-")
            .tempdir()
            .map_err(|e| ProxyError::render(format!("Failed to create render workspace: {e}")))?;
        std::fs::write(workspace.path().join(TITLE_TEXT_FILE), &request.overlay.text)?;

        let args = self.build_args(&request);
        self.run_ffmpeg(&args, workspace.path(), request.duration_secs)
    }

    fn is_available(&self) -> bool {
        command_exists(&self.ffmpeg) && command_exists(&self.ffprobe)
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Container tag reader backed by `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfprobeTags {
    ffprobe: String,
}

impl EmbeddedMetadata for FfprobeTags {
    fn supports_location_extraction(&self) -> bool {
        true
    }

    fn read_tags(&self, path: &Path) -> ProxygenResult<EmbeddedTags> {
        let output = run_ffprobe(&self.ffprobe, &["-show_entries", "format_tags"], path)
            .map_err(|e| ProxyError::metadata(e.to_string()))?;
        parse_tags_output(&output)
    }
}

fn run_ffprobe(binary: &str, entries: &[&str], path: &Path) -> ProxygenResult<String> {
    let output = Command::new(binary)
        .args(["-v", "error"])
        .args(entries)
        .args(["-of", "json"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ProxyError::probe(format!("Failed to start ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(ProxyError::probe(format!(
            "ffprobe failed on {} ({}): {}",
            path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| ProxyError::probe(format!("ffprobe emitted invalid UTF-8: {e}")))
}

#[derive(Debug, Default, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: ProbeFormat,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

impl ProbeStream {
    /// Display rotation in degrees, normalized to `0..360`.
    ///
    /// The display matrix side data wins over the legacy `rotate` tag.
    fn rotation_degrees(&self) -> i64 {
        let raw = self
            .side_data_list
            .iter()
            .find_map(|side| side.rotation)
            .or_else(|| self.tags.get("rotate").and_then(|r| r.trim().parse().ok()))
            .unwrap_or(0.0);
        (raw.round() as i64).rem_euclid(360)
    }

    /// Frame size as displayed, after applying rotation.
    fn display_size(&self) -> Option<(u32, u32)> {
        let (width, height) = (self.width?, self.height?);
        match self.rotation_degrees() {
            90 | 270 => Some((height, width)),
            _ => Some((width, height)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

fn parse_probe_output(json: &str) -> ProxygenResult<MediaInfo> {
    let probe: ProbeOutput = serde_json::from_str(json)?;

    let duration_secs = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ProxyError::probe("Source reports no duration"))?;

    let (width, height) = probe
        .streams
        .first()
        .and_then(ProbeStream::display_size)
        .filter(|(w, h)| *w > 0 && *h > 0)
        .ok_or_else(|| ProxyError::probe("Source has no video stream"))?;

    Ok(MediaInfo {
        duration_secs,
        width,
        height,
    })
}

fn parse_tags_output(json: &str) -> ProxygenResult<EmbeddedTags> {
    let probe: ProbeOutput = serde_json::from_str(json)?;
    let tags: HashMap<String, String> = probe
        .format
        .tags
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v))
        .collect();

    let creation_time = tags
        .get("creation_time")
        .and_then(|value| DateTime::parse_from_rfc3339(value.trim()).ok())
        .map(|time| time.with_timezone(&Local));

    let location = ["location", "com.apple.quicktime.location.iso6709", "location-eng"]
        .iter()
        .find_map(|key| tags.get(*key))
        .and_then(|value| format_iso6709(value));

    Ok(EmbeddedTags {
        creation_time,
        location,
    })
}

/// Format an ISO 6709 point (`+48.8566+002.3522+035.000/`) as `lat, lon`.
fn format_iso6709(value: &str) -> Option<String> {
    let value = value.trim().trim_end_matches('/');
    let mut parts = Vec::with_capacity(3);
    let mut current = String::new();
    for c in value.chars() {
        if (c == '+' || c == '-') && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        parts.push(current);
    }

    let lat = parts.first()?.parse::<f64>().ok()?;
    let lon = parts.get(1)?.parse::<f64>().ok()?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    Some(format!("{lat:.4}, {lon:.4}"))
}

/// Warn every `timeout` without a progress tick. Returns the number of
/// warnings once the sender is dropped.
fn watch_for_stalls(ticks: Receiver<f64>, timeout: Duration) -> usize {
    let started = Instant::now();
    let mut out_time_secs = 0.0;
    let mut stalls = 0;
    loop {
        match ticks.recv_timeout(timeout) {
            Ok(secs) => out_time_secs = secs,
            Err(RecvTimeoutError::Timeout) => {
                stalls += 1;
                tracing::warn!(
                    out_time_secs,
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    stall_secs = timeout.as_secs_f64(),
                    "No ffmpeg progress advancement"
                );
            }
            Err(RecvTimeoutError::Disconnected) => return stalls,
        }
    }
}

fn command_exists(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both keys.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }

    fn fraction(&self, expected_secs: f64) -> f64 {
        if self.complete {
            return 1.0;
        }
        if expected_secs <= 0.0 {
            return 0.0;
        }
        (self.out_time_secs / expected_secs).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecOptions;
    use crate::compositor::TitleLayer;
    use proxygen_media_model::title_card::TitleStyle;
    use std::path::PathBuf;

    fn request() -> RenderRequest {
        RenderRequest {
            source: PathBuf::from("/media/clip.mov"),
            start_secs: 12.5,
            duration_secs: 5.0,
            width: 640,
            height: 360,
            overlay: TitleLayer {
                text: "File: clip".to_string(),
                style: TitleStyle::default(),
            },
            output_path: PathBuf::from("/out/.proxygen-abc.mp4"),
            options: CodecOptions::default(),
        }
    }

    fn lossy(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let idx = args.iter().position(|a| a == flag).unwrap();
        &args[idx + 1]
    }

    #[test]
    fn test_render_args() {
        let args = lossy(&FfmpegCodec::new().build_args(&request()));
        assert_eq!(value_after(&args, "-ss"), "12.500000");
        assert_eq!(value_after(&args, "-i"), "/media/clip.mov");
        assert_eq!(value_after(&args, "-t"), "5.000000");
        assert_eq!(value_after(&args, "-c:v"), "libx264");
        assert_eq!(value_after(&args, "-c:a"), "aac");
        assert_eq!(value_after(&args, "-f"), "mp4");
        assert_eq!(args.last().unwrap(), "/out/.proxygen-abc.mp4");
        assert!(value_after(&args, "-filter_complex").contains("scale=640:360"));
        // Seeking happens on the input, before -i.
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input);
    }

    #[test]
    fn test_render_args_pad_both_streams_to_window() {
        let args = lossy(&FfmpegCodec::new().build_args(&request()));
        let graph = value_after(&args, "-filter_complex");
        assert!(graph.contains(",tpad=stop_mode=clone:stop_duration=5.000,format=yuv420p[vout]"));
        assert_eq!(value_after(&args, "-af"), "apad");
        // Padding is unbounded; -t must still cap the output.
        assert_eq!(value_after(&args, "-t"), "5.000000");
    }

    #[cfg(unix)]
    #[test]
    fn test_render_args_keep_non_utf8_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut request = request();
        request.source = PathBuf::from(OsStr::from_bytes(b"/media/caf\xe9.mov"));
        request.output_path = PathBuf::from(OsStr::from_bytes(b"/out/caf\xe9_proxy.mp4"));

        let args = FfmpegCodec::new().build_args(&request);
        assert!(args.contains(&request.source.clone().into_os_string()));
        assert_eq!(args.last(), Some(&request.output_path.clone().into_os_string()));
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "programs": [],
            "streams": [{"width": 1920, "height": 1080}],
            "format": {"duration": "63.480000"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert!((info.duration_secs - 63.48).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_stream_reports_display_size() {
        let json = r#"{
            "streams": [{"width": 1920, "height": 1080, "side_data_list": [{"rotation": -90}]}],
            "format": {"duration": "12.0"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!((info.width, info.height), (1080, 1920));
        assert_eq!(crate::compositor::target_height(info.width, info.height, 640), 1136);
    }

    #[test]
    fn test_rotate_tag_and_upside_down() {
        let tagged = r#"{
            "streams": [{"width": 1280, "height": 720, "tags": {"rotate": "270"}}],
            "format": {"duration": "12.0"}
        }"#;
        let info = parse_probe_output(tagged).unwrap();
        assert_eq!((info.width, info.height), (720, 1280));

        let flipped = r#"{
            "streams": [{"width": 1280, "height": 720, "side_data_list": [{"rotation": 180}]}],
            "format": {"duration": "12.0"}
        }"#;
        let info = parse_probe_output(flipped).unwrap();
        assert_eq!((info.width, info.height), (1280, 720));
    }

    #[test]
    fn test_parse_probe_output_without_video_stream() {
        let json = r#"{"streams": [], "format": {"duration": "10.0"}}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(ProxyError::Probe { .. })
        ));
    }

    #[test]
    fn test_parse_probe_output_without_duration() {
        let json = r#"{"streams": [{"width": 640, "height": 480}], "format": {}}"#;
        assert!(parse_probe_output(json).is_err());
    }

    #[test]
    fn test_parse_tags() {
        let json = r#"{"format": {"tags": {
            "creation_time": "2021-06-01T12:30:00.000000Z",
            "com.apple.quicktime.location.ISO6709": "+48.8566+002.3522+035.000/"
        }}}"#;
        let tags = parse_tags_output(json).unwrap();
        let expected = DateTime::parse_from_rfc3339("2021-06-01T12:30:00Z")
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(tags.creation_time, Some(expected));
        assert_eq!(tags.location.as_deref(), Some("48.8566, 2.3522"));
    }

    #[test]
    fn test_parse_tags_missing() {
        let tags = parse_tags_output(r#"{"format": {}}"#).unwrap();
        assert_eq!(tags, EmbeddedTags::default());
    }

    #[test]
    fn test_iso6709_southern_western() {
        assert_eq!(
            format_iso6709("-33.8688+151.2093/").as_deref(),
            Some("-33.8688, 151.2093")
        );
        assert_eq!(
            format_iso6709("+40.7128-074.0060/").as_deref(),
            Some("40.7128, -74.0060")
        );
        assert_eq!(format_iso6709("garbage"), None);
    }

    #[test]
    fn test_progress_state() {
        let mut state = ProgressState::default();
        state.update("out_time_us", "2500000");
        assert!((state.fraction(5.0) - 0.5).abs() < 1e-9);
        state.update("progress", "end");
        assert_eq!(state.fraction(5.0), 1.0);
    }

    #[test]
    fn test_watchdog_warns_without_any_output() {
        let (ticks, rx) = mpsc::channel::<f64>();
        let watchdog =
            std::thread::spawn(move || watch_for_stalls(rx, Duration::from_millis(20)));
        std::thread::sleep(Duration::from_millis(110));
        drop(ticks);
        assert!(watchdog.join().unwrap() >= 2);
    }

    #[test]
    fn test_watchdog_quiet_while_progressing() {
        let (ticks, rx) = mpsc::channel::<f64>();
        let watchdog =
            std::thread::spawn(move || watch_for_stalls(rx, Duration::from_secs(5)));
        for i in 1..=5 {
            ticks.send(i as f64).unwrap();
        }
        drop(ticks);
        assert_eq!(watchdog.join().unwrap(), 0);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let codec = FfmpegCodec::with_binaries(
            "/nonexistent/proxygen-ffmpeg",
            "/nonexistent/proxygen-ffprobe",
        );
        assert!(!codec.is_available());
        assert!(codec.probe(Path::new("/nonexistent/clip.mp4")).is_err());
    }
}
