use std::process::Command;

use crate::error::{DisplayError, VidspanError};
use crate::Result;

/// Monitor rectangle in virtual-screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Snapshot of one active display. Valid only for the enumeration call
/// that produced it; device ids are not stable across hotplug or reboot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Display {
    pub index: usize,
    pub bounds: Bounds,
    pub work_area: Bounds,
    pub device_id: String,
}

/// Queries the display server for the set of active monitors by running
/// an xrandr-style query tool and parsing its output. Every call
/// re-queries, so hot-plugged monitors show up on the next enumeration.
#[derive(Debug, Clone)]
pub struct DisplayEnumerator {
    query_command: String,
}

impl DisplayEnumerator {
    pub fn new(query_command: impl Into<String>) -> Self {
        Self {
            query_command: query_command.into(),
        }
    }

    pub fn enumerate(&self) -> Result<Vec<Display>> {
        let output = Command::new(&self.query_command)
            .arg("--query")
            .output()
            .map_err(|e| {
                VidspanError::Display(DisplayError::CommandRun {
                    command: self.query_command.clone(),
                    source: e,
                })
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::error!(
                "{} --query failed - exit code: {:?}, stderr: {}",
                self.query_command,
                output.status.code(),
                stderr
            );
            return Err(VidspanError::Display(DisplayError::CommandStatus {
                command: self.query_command.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.to_string(),
            }));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let displays = parse_connected_outputs(&stdout);

        if displays.is_empty() {
            log::warn!("No active outputs parsed from query stdout: {}", stdout);
            return Err(VidspanError::Display(DisplayError::NoDisplays));
        }

        log::info!("Found {} active displays", displays.len());
        Ok(displays)
    }
}

/// Parses `xrandr --query` output lines of the form
/// `HDMI-1 connected primary 1920x1080+0+0 (normal ...) 509mm x 286mm`.
/// Connected outputs without an active mode carry no geometry token and
/// are skipped.
fn parse_connected_outputs(stdout: &str) -> Vec<Display> {
    let mut displays = Vec::new();

    for line in stdout.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 || tokens[1] != "connected" {
            continue;
        }

        let geometry = tokens[2..]
            .iter()
            .take(3)
            .find_map(|token| parse_geometry(token));

        let Some((width, height, x, y)) = geometry else {
            log::debug!("Skipping connected output without active geometry: {}", line);
            continue;
        };

        let bounds = Bounds {
            left: x,
            top: y,
            right: x + width as i32,
            bottom: y + height as i32,
        };

        displays.push(Display {
            index: displays.len(),
            bounds,
            // The query tool reports no work-area concept; the full
            // bounds stand in until per-monitor placement needs it.
            work_area: bounds,
            device_id: tokens[0].to_string(),
        });
    }

    displays
}

/// Parses an X geometry token like `1920x1080+0+0` or `1280x1024-1280+0`
/// into (width, height, x, y). Zero-sized modes are rejected.
fn parse_geometry(token: &str) -> Option<(u32, u32, i32, i32)> {
    let offset_start = token.find(['+', '-'])?;
    let (size, offsets) = token.split_at(offset_start);

    let (w, h) = size.split_once('x')?;
    let width: u32 = w.parse().ok()?;
    let height: u32 = h.parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }

    let mut signs = offsets
        .char_indices()
        .filter(|(_, c)| *c == '+' || *c == '-')
        .map(|(i, _)| i);
    let first = signs.next()?;
    let second = signs.next()?;
    if signs.next().is_some() || first != 0 {
        return None;
    }

    let x: i32 = offsets[first..second].parse().ok()?;
    let y: i32 = offsets[second..].parse().ok()?;
    Some((width, height, x, y))
}

/// Human-readable per-screen summary for status output.
pub fn format_summary(displays: &[Display]) -> String {
    let mut info = Vec::new();
    for display in displays {
        let b = &display.bounds;
        info.push(format!(
            "Screen {} ({}):\n  position: left={}, top={}, right={}, bottom={}\n  resolution: {}x{}",
            display.index + 1,
            display.device_id,
            b.left,
            b.top,
            b.right,
            b.bottom,
            b.width(),
            b.height()
        ));
    }
    info.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const XRANDR_DUAL: &str = "\
Screen 0: minimum 320 x 200, current 3840 x 1080, maximum 16384 x 16384
HDMI-1 connected primary 1920x1080+0+0 (normal left inverted right x axis y axis) 509mm x 286mm
   1920x1080     60.00*+  50.00    59.94
DP-1 connected 1920x1080+1920+0 (normal left inverted right x axis y axis) 527mm x 296mm
   1920x1080     60.00*+
DP-2 disconnected (normal left inverted right x axis y axis)
";

    #[test]
    fn test_parse_dual_monitor_layout() {
        let displays = parse_connected_outputs(XRANDR_DUAL);

        assert_eq!(displays.len(), 2);

        assert_eq!(displays[0].index, 0);
        assert_eq!(displays[0].device_id, "HDMI-1");
        assert_eq!(
            displays[0].bounds,
            Bounds { left: 0, top: 0, right: 1920, bottom: 1080 }
        );

        assert_eq!(displays[1].index, 1);
        assert_eq!(displays[1].device_id, "DP-1");
        assert_eq!(displays[1].bounds.left, 1920);
        assert_eq!(displays[1].bounds.right, 3840);
    }

    #[test]
    fn test_parse_skips_inactive_connected_output() {
        let stdout = "\
HDMI-1 connected (normal left inverted right x axis y axis)
eDP-1 connected 1366x768+0+0 (normal left inverted right x axis y axis) 310mm x 174mm
";
        let displays = parse_connected_outputs(stdout);

        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].device_id, "eDP-1");
        assert_eq!(displays[0].index, 0);
    }

    #[test]
    fn test_parse_negative_offsets() {
        let stdout =
            "DP-3 connected 1280x1024-1280+0 (normal left inverted right x axis y axis)\n";
        let displays = parse_connected_outputs(stdout);

        assert_eq!(displays.len(), 1);
        let b = displays[0].bounds;
        assert_eq!(b.left, -1280);
        assert_eq!(b.right, 0);
        assert_eq!(b.top, 0);
        assert_eq!(b.bottom, 1024);
    }

    #[test]
    fn test_bounds_invariant_holds_for_parsed_output() {
        for display in parse_connected_outputs(XRANDR_DUAL) {
            assert!(display.bounds.right > display.bounds.left);
            assert!(display.bounds.bottom > display.bounds.top);
        }
    }

    #[test]
    fn test_parse_geometry_rejects_malformed_tokens() {
        assert_eq!(parse_geometry("primary"), None);
        assert_eq!(parse_geometry("1920x1080"), None);
        assert_eq!(parse_geometry("0x0+0+0"), None);
        assert_eq!(parse_geometry("(normal"), None);
        assert!(parse_geometry("1920x1080+0+0").is_some());
    }

    #[test]
    fn test_enumerate_fails_when_command_missing() {
        let enumerator = DisplayEnumerator::new("vidspan-test-no-such-query-tool");
        let result = enumerator.enumerate();

        assert!(result.is_err());
        match result.unwrap_err() {
            VidspanError::Display(DisplayError::CommandRun { command, .. }) => {
                assert_eq!(command, "vidspan-test-no-such-query-tool");
            }
            other => panic!("Expected DisplayError::CommandRun, got {:?}", other),
        }
    }

    #[test]
    fn test_format_summary() {
        let displays = parse_connected_outputs(XRANDR_DUAL);
        let summary = format_summary(&displays);

        assert!(summary.contains("Screen 1 (HDMI-1)"));
        assert!(summary.contains("Screen 2 (DP-1)"));
        assert!(summary.contains("resolution: 1920x1080"));
        assert!(summary.contains("left=1920"));
    }
}
