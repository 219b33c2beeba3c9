//! Subcommand implementations.

use crate::cli::{Cli, Command};
use anyhow::{Context, Result, anyhow, bail};
use kurbo::Size;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tradeboard_core::config::EngineConfig;
use tradeboard_core::storage::{CanvasPatch, capture_thumbnail_with_quality};
use tradeboard_core::{
    AutoSaveManager, Canvas, CanvasData, EventHandler, FileStore, InputEvent, PersistenceAdapter,
    Preferences,
};
use tradeboard_render::{PixmapRenderer, RenderContext};

type Adapter = PersistenceAdapter<FileStore>;

/// Run a parsed command line, writing human-readable output to `out`.
pub async fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let preferences_path = cli.config.clone().or_else(Preferences::default_path);
    let preferences = match &preferences_path {
        Some(path) => Preferences::load(path)
            .with_context(|| format!("Failed to load preferences from {}", path.display()))?,
        None => Preferences::default(),
    };

    if let Command::InitConfig = cli.command {
        let path = preferences_path
            .ok_or_else(|| anyhow!("Could not determine a preferences path"))?;
        return init_config(&preferences, &path, out);
    }
    if let Command::Shortcuts = cli.command {
        return print_shortcuts(&preferences, out);
    }

    let store = match cli.store {
        Some(dir) => FileStore::new(dir),
        None => FileStore::default_location(),
    }
    .context("Failed to open canvas store")?;
    log::debug!("Using canvas store at {}", store.base_path().display());
    let adapter = PersistenceAdapter::new(Arc::new(store));

    match cli.command {
        Command::List => list(&adapter, out).await,
        Command::New { name } => {
            let patch = name.map(CanvasPatch::named).unwrap_or_default();
            let data = adapter.create(patch).await.context("Failed to create canvas")?;
            writeln!(out, "{}", data.id)?;
            Ok(())
        }
        Command::Show { id, json } => {
            let data = load(&adapter, &id).await?;
            if json {
                writeln!(out, "{}", data.to_json()?)?;
            } else {
                print_summary(&data, out)?;
            }
            Ok(())
        }
        Command::Delete { id } => {
            adapter
                .delete(&id)
                .await
                .with_context(|| format!("Failed to delete canvas {}", id))?;
            writeln!(out, "Deleted {}", id)?;
            Ok(())
        }
        Command::Replay {
            script,
            canvas,
            name,
            width,
            height,
        } => {
            let viewport = Size::new(width as f64, height as f64);
            replay(
                &adapter,
                &preferences,
                &script,
                canvas.as_deref(),
                name.as_deref(),
                viewport,
                out,
            )
            .await
        }
        Command::Render {
            id,
            output,
            width,
            height,
            fit,
        } => {
            let data = load(&adapter, &id).await?;
            let mut canvas = Canvas::new(preferences.engine.clone());
            canvas.load(&data);
            let viewport = Size::new(width as f64, height as f64);
            if fit {
                canvas.fit_to_content(viewport);
            }
            let mut renderer = PixmapRenderer::new();
            let frame = renderer
                .render(&RenderContext::new(&canvas, viewport).with_hide_ui(true))
                .context("Failed to render canvas")?;
            fs::write(&output, frame.encode_png()?)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            writeln!(out, "Rendered {} to {}", data.name, output.display())?;
            Ok(())
        }
        Command::Shortcuts | Command::InitConfig => Ok(()),
    }
}

async fn load(adapter: &Adapter, id: &str) -> Result<CanvasData> {
    adapter
        .get(id)
        .await
        .ok_or_else(|| anyhow!("Canvas {} not found", id))
}

async fn list(adapter: &Adapter, out: &mut dyn Write) -> Result<()> {
    let items = adapter.list().await;
    if items.is_empty() {
        writeln!(out, "No canvases")?;
    }
    for item in items {
        writeln!(out, "{}  {}  {}", item.id, format_millis(item.updated_at), item.name)?;
    }
    Ok(())
}

fn print_summary(data: &CanvasData, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{} ({})", data.name, data.id)?;
    writeln!(out, "  strokes:   {}", data.strokes.len())?;
    writeln!(out, "  texts:     {}", data.texts.len())?;
    writeln!(
        out,
        "  transform: scale {:.2}, offset ({:.1}, {:.1})",
        data.transform.scale, data.transform.offset.x, data.transform.offset.y
    )?;
    writeln!(out, "  created:   {}", format_millis(data.created_at))?;
    writeln!(out, "  updated:   {}", format_millis(data.updated_at))?;
    writeln!(out, "  thumbnail: {}", if data.thumbnail.is_some() { "yes" } else { "no" })?;
    Ok(())
}

fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

async fn replay(
    adapter: &Adapter,
    preferences: &Preferences,
    script: &Path,
    canvas_id: Option<&str>,
    name: Option<&str>,
    viewport: Size,
    out: &mut dyn Write,
) -> Result<()> {
    let json = fs::read_to_string(script)
        .with_context(|| format!("Failed to read {}", script.display()))?;
    let events: Vec<InputEvent> = serde_json::from_str(&json)
        .with_context(|| format!("Invalid event script {}", script.display()))?;

    let mut canvas = Canvas::new(preferences.engine.clone());
    let mut autosave = AutoSaveManager::new(adapter.clone());
    match canvas_id {
        Some(id) => {
            if !autosave.load(id, &mut canvas).await {
                bail!("Canvas {} not found", id);
            }
        }
        // An untouched new canvas has nothing to save
        None => autosave.mark_saved(&canvas),
    }

    let mut handler = EventHandler::new(preferences.shortcuts.clone());
    let handled = events.iter().filter(|event| handler.handle(&mut canvas, event)).count();
    canvas.finish_text_editing();
    log::info!("Replayed {} of {} events", handled, events.len());

    if !autosave.is_dirty(&canvas) {
        writeln!(out, "No changes")?;
        return Ok(());
    }

    let thumbnail = thumbnail_for(&canvas, viewport, &preferences.engine);
    let data = adapter
        .save_canvas(autosave.canvas_id(), name, &canvas, thumbnail)
        .await
        .context("Failed to save canvas")?;
    autosave.mark_saved(&canvas);
    writeln!(
        out,
        "Saved {} ({}): {} strokes, {} texts",
        data.name,
        data.id,
        data.strokes.len(),
        data.texts.len()
    )?;
    Ok(())
}

/// Render the session and encode a thumbnail. Failures leave it out.
fn thumbnail_for(canvas: &Canvas, viewport: Size, config: &EngineConfig) -> Option<String> {
    let mut renderer = PixmapRenderer::new();
    match renderer.render(&RenderContext::new(canvas, viewport).with_hide_ui(true)) {
        Ok(frame) => Some(capture_thumbnail_with_quality(
            frame,
            config.thumbnail_width,
            config.thumbnail_height,
            config.thumbnail_quality,
        )),
        Err(e) => {
            log::warn!("Skipping thumbnail: {}", e);
            None
        }
    }
}

fn init_config(preferences: &Preferences, path: &Path, out: &mut dyn Write) -> Result<()> {
    preferences
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writeln!(out, "Wrote {}", path.display())?;
    Ok(())
}

fn print_shortcuts(preferences: &Preferences, out: &mut dyn Write) -> Result<()> {
    for (action, shortcut) in preferences.shortcuts.iter() {
        writeln!(out, "{:<18} {}", shortcut.format(), action.description())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    struct Env {
        dir: tempfile::TempDir,
    }

    impl Env {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn run(&self, args: &[&str]) -> Result<String> {
            let store = self.path("store");
            let config = self.path("preferences.json");
            let mut argv = vec![
                "tradeboard",
                "--store",
                store.to_str().unwrap(),
                "--config",
                config.to_str().unwrap(),
            ];
            argv.extend_from_slice(args);
            let cli = Cli::try_parse_from(argv).unwrap();
            let mut out = Vec::new();
            pollster::block_on(run(cli, &mut out))?;
            Ok(String::from_utf8(out).unwrap())
        }
    }

    const SCRIPT: &str = r#"[
        {"type":"pressed","key":"p"},
        {"type":"down","position":{"x":100,"y":100}},
        {"type":"move","position":{"x":200,"y":150}},
        {"type":"move","position":{"x":300,"y":120}},
        {"type":"up","position":{"x":300,"y":120}},
        {"type":"pressed","key":"t"},
        {"type":"down","position":{"x":400,"y":400}},
        {"type":"pressed","key":"H"},
        {"type":"pressed","key":"i"},
        {"type":"pressed","key":"Escape"}
    ]"#;

    #[test]
    fn test_new_list_delete() {
        let env = Env::new();
        assert!(env.run(&["list"]).unwrap().contains("No canvases"));

        let id = env.run(&["new", "--name", "Gold weekly"]).unwrap().trim().to_string();
        let listing = env.run(&["list"]).unwrap();
        assert!(listing.contains(&id));
        assert!(listing.contains("Gold weekly"));

        env.run(&["delete", &id]).unwrap();
        assert!(env.run(&["delete", &id]).is_err());
        assert!(env.run(&["show", &id]).is_err());
    }

    #[test]
    fn test_replay_saves_canvas_with_thumbnail() {
        let env = Env::new();
        let script = env.path("session.json");
        fs::write(&script, SCRIPT).unwrap();

        let script = script.to_str().unwrap();
        let args = ["replay", script, "--name", "Review", "--width", "640", "--height", "480"];
        let output = env.run(&args).unwrap();
        assert!(output.contains("1 strokes, 1 texts"), "{output}");

        let listing = env.run(&["list"]).unwrap();
        let id = listing.split_whitespace().next().unwrap().to_string();
        let json = env.run(&["show", &id, "--json"]).unwrap();
        let data = CanvasData::from_json(&json).unwrap();
        assert_eq!(data.name, "Review");
        assert_eq!(data.texts[0].text(), "Hi");
        assert!(data.thumbnail.unwrap().starts_with("data:image/jpeg;base64,"));

        // Continue the same canvas; history starts fresh so undo has nothing to revert.
        let more = env.path("more.json");
        fs::write(
            &more,
            r#"[
                {"type":"pressed","key":"z","modifiers":{"ctrl":true}},
                {"type":"pressed","key":"p"},
                {"type":"down","position":{"x":10,"y":10}},
                {"type":"move","position":{"x":60,"y":10}},
                {"type":"up","position":{"x":60,"y":10}}
            ]"#,
        )
        .unwrap();
        let output = env.run(&["replay", more.to_str().unwrap(), "--canvas", &id]).unwrap();
        assert!(output.contains(&id));
        assert!(output.contains("2 strokes, 1 texts"), "{output}");
        let summary = env.run(&["show", &id]).unwrap();
        assert!(summary.contains("Review"));
    }

    #[test]
    fn test_replay_without_changes_is_not_saved() {
        let env = Env::new();
        let script = env.path("empty.json");
        fs::write(&script, "[]").unwrap();
        let output = env.run(&["replay", script.to_str().unwrap()]).unwrap();
        assert!(output.contains("No changes"));
        assert!(env.run(&["list"]).unwrap().contains("No canvases"));
    }

    #[test]
    fn test_replay_saves_view_only_changes() {
        let env = Env::new();
        let id = env.run(&["new", "--name", "Panned"]).unwrap().trim().to_string();
        let script = env.path("pan.json");
        fs::write(
            &script,
            r#"[{"type":"scroll","position":{"x":100,"y":100},"delta":{"x":0,"y":40}}]"#,
        )
        .unwrap();

        let output = env.run(&["replay", script.to_str().unwrap(), "--canvas", &id]).unwrap();
        assert!(output.contains("0 strokes, 0 texts"), "{output}");
        let data = CanvasData::from_json(&env.run(&["show", &id, "--json"]).unwrap()).unwrap();
        assert_eq!(data.transform.offset, kurbo::Point::new(0.0, -40.0));
    }

    #[test]
    fn test_invalid_script_is_an_error() {
        let env = Env::new();
        let script = env.path("bad.json");
        fs::write(&script, "{not events").unwrap();
        let err = env.run(&["replay", script.to_str().unwrap()]).unwrap_err();
        assert!(err.to_string().contains("Invalid event script"));
    }

    #[test]
    fn test_render_png() {
        let env = Env::new();
        let script = env.path("session.json");
        fs::write(&script, SCRIPT).unwrap();
        env.run(&["replay", script.to_str().unwrap()]).unwrap();
        let listing = env.run(&["list"]).unwrap();
        let id = listing.split_whitespace().next().unwrap().to_string();

        let png = env.path("out.png");
        let png_path = png.to_str().unwrap();
        let args = ["render", id.as_str(), png_path, "--width", "320", "--height", "200", "--fit"];
        env.run(&args).unwrap();
        let image = image::open(&png).unwrap();
        assert_eq!((image.width(), image.height()), (320, 200));
    }

    #[test]
    fn test_init_config_and_shortcuts() {
        let env = Env::new();
        env.run(&["init-config"]).unwrap();
        assert!(env.path("preferences.json").exists());
        let shortcuts = env.run(&["shortcuts"]).unwrap();
        assert!(shortcuts.contains("Ctrl+Shift+Z"), "{shortcuts}");
    }
}
