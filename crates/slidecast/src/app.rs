use eframe::egui;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::deck;
use crate::navigation::Navigator;
use crate::prefs::{FileStore, MemoryStore, PreferenceStore, Preferences};
use crate::render;
use crate::render::image_cache::ImageCache;
use crate::render::panels::{self, UiAction};
use crate::schedule::Millis;
use crate::session::{LoadRequest, Session};
use crate::speech::{Narrator, SystemSpeaker};
use crate::theme::Theme;
use crate::view::AssetResolver;

const CLOCK_REFRESH: Duration = Duration::from_secs(1);

struct SlidecastApp {
    session: Session,
    theme: Theme,
    image_cache: ImageCache,
    started: Instant,
}

impl SlidecastApp {
    fn new(ctx: &egui::Context, session: Session, started: Instant) -> Self {
        let theme = Theme::from_dark_flag(session.prefs().dark_theme());
        ctx.set_visuals(theme.visuals());
        Self {
            session,
            theme,
            image_cache: ImageCache::new(),
            started,
        }
    }

    fn now(&self) -> Millis {
        self.started.elapsed().as_millis() as Millis
    }

    fn apply(&mut self, ctx: &egui::Context, action: UiAction, now: Millis) {
        match action {
            UiAction::Previous => self.session.previous(now),
            UiAction::Next => self.session.next(now),
            UiAction::JumpTo(index) => self.session.jump_to(index, now),
            UiAction::ToggleFullscreen => {
                let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
            }
            UiAction::ToggleTheme => {
                let dark = self.session.toggle_theme();
                self.theme = Theme::from_dark_flag(dark);
                ctx.set_visuals(self.theme.visuals());
            }
            UiAction::ToggleNarration => {
                self.session.toggle_narration();
            }
            UiAction::ToggleNotes => self.session.toggle_notes(),
            UiAction::DismissIntro => self.session.dismiss_intro(true),
        }
    }

    fn process_load_requests(&mut self, ctx: &egui::Context) {
        for request in self.session.take_load_requests() {
            match request {
                LoadRequest::Eager(path) => self.image_cache.load_now(ctx, &path),
                LoadRequest::Preload(path) => self.image_cache.preload(&path),
            }
        }
        self.image_cache.discard_stale();
    }

    fn schedule_repaint(&self, ctx: &egui::Context, now: Millis) {
        if self.session.is_animating(now) {
            ctx.request_repaint();
            return;
        }
        if let Some(due) = self.session.next_due() {
            ctx.request_repaint_after(Duration::from_millis(due.saturating_sub(now)));
        }
        if self.session.panels().notes {
            ctx.request_repaint_after(CLOCK_REFRESH);
        }
    }
}

impl eframe::App for SlidecastApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = self.now();
        self.session.tick(now);

        let intro_open = self.session.intro().is_open();
        let mut actions: Vec<UiAction> = Vec::new();
        let mut toggle_thumbnails = false;

        // Collect viewport commands to send AFTER the input closure
        // (sending inside ctx.input() causes RwLock deadlock)
        let mut viewport_cmds: Vec<egui::ViewportCommand> = Vec::new();

        ctx.input(|i| {
            if i.key_pressed(egui::Key::Q) {
                viewport_cmds.push(egui::ViewportCommand::Close);
                return;
            }
            if intro_open && (i.key_pressed(egui::Key::Enter) || i.key_pressed(egui::Key::Space))
            {
                actions.push(UiAction::DismissIntro);
                return;
            }
            if i.key_pressed(egui::Key::F) {
                viewport_cmds.push(egui::ViewportCommand::Fullscreen(
                    !i.viewport().fullscreen.unwrap_or(false),
                ));
            }
            if i.key_pressed(egui::Key::T) {
                toggle_thumbnails = true;
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                actions.push(UiAction::Next);
            }
            if i.key_pressed(egui::Key::ArrowLeft) {
                actions.push(UiAction::Previous);
            }
        });

        for cmd in viewport_cmds {
            ctx.send_viewport_cmd(cmd);
        }
        if toggle_thumbnails {
            self.session.toggle_thumbnails();
        }

        let fullscreen = ctx.input(|i| i.viewport().fullscreen.unwrap_or(false));
        panels::control_bar(ctx, &self.session, fullscreen, &self.theme, &mut actions);
        if self.session.panels().thumbnails {
            panels::thumbnail_panel(ctx, self.session.nav(), &self.theme, &mut actions);
        }
        if self.session.panels().notes {
            panels::notes_panel(ctx, &self.session, now, &self.theme);
        }
        panels::intro_window(ctx, self.session.intro_mut(), &self.theme, &mut actions);

        let bg = self.theme.background;
        let mut clicked_video: Option<PathBuf> = None;
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(bg).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                ui.painter().rect_filled(rect, 0.0, bg);
                let scale = render::compute_scale(rect);

                let nav = self.session.nav();
                for index in nav.visible_slides() {
                    let Some(view) = nav.view(index) else {
                        continue;
                    };
                    if let Some(path) = render::render_slide(
                        ui,
                        view,
                        nav.flags(index),
                        nav.reveal(),
                        &self.theme,
                        rect,
                        &self.image_cache,
                        now,
                        scale,
                    ) {
                        clicked_video = Some(path);
                    }
                }
                panels::draw_progress(ui, rect, nav.progress_percent(), &self.theme);
            });

        if let Some(path) = clicked_video {
            tracing::debug!("Opening video {}", path.display());
            if let Err(e) = open::that(&path) {
                tracing::warn!("Failed to open {}: {e}", path.display());
            }
        }

        for action in actions {
            self.apply(ctx, action, now);
        }
        self.process_load_requests(ctx);
        self.schedule_repaint(ctx, now);
    }
}

impl Drop for SlidecastApp {
    fn drop(&mut self) {
        self.session.finish(self.now());
    }
}

fn preference_store(ephemeral: bool) -> Box<dyn PreferenceStore> {
    if ephemeral {
        return Box::<MemoryStore>::default();
    }
    match FileStore::default_path() {
        Ok(path) => {
            let store = FileStore::open(&path);
            tracing::debug!("Preferences at {}", store.path().display());
            Box::new(store)
        }
        Err(e) => {
            tracing::warn!("{e:#}; preferences will not be saved");
            Box::<MemoryStore>::default()
        }
    }
}

pub fn run(
    file: PathBuf,
    windowed: bool,
    start_slide: Option<usize>,
    ephemeral: bool,
) -> anyhow::Result<()> {
    let deck = deck::load(&file)?;
    let config = Config::load_or_default();
    let assets = AssetResolver::new(&deck.base_path, config.asset_dir(), config.placeholder());
    let navigator = Navigator::new(deck.slides, &assets)?;

    // CLI flag (1-indexed) overrides config
    let initial_slide = start_slide
        .map(|s| s.saturating_sub(1))
        .or(config.start_slide())
        .unwrap_or(0);

    let title = format!(
        "slidecast - {}",
        file.file_name().unwrap_or_default().to_string_lossy()
    );

    let viewport = if windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let prefs = Preferences::load(preference_store(ephemeral));
    let narrator = Narrator::new(Box::new(SystemSpeaker::detect()), config.language());
    tracing::debug!("Narration language: {}", narrator.language());

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let started = Instant::now();
            let session = Session::new(navigator, prefs, narrator, initial_slide, 0);
            Ok(Box::new(SlidecastApp::new(&cc.egui_ctx, session, started)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
