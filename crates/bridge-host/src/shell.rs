//! Host Shell - window and event loop
//!
//! Translates winit events into the bridge's lifecycle triggers:
//! 1. Window creation is the window-ready event
//! 2. Occlusion and suspend/resume flip front buffer availability
//! 3. Redraws are the compositor's per-frame notifications
//! 4. Close tears the native surface down before the window goes away

use crate::compositor::{FrameClock, WindowImageSource};
use bridge_core::{
    BridgeConfig, FrameOutcome, LifecycleController, SurfaceProvider, WindowIdentity,
};
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

pub struct BridgeShell<P: SurfaceProvider> {
    /// Surface lifecycle; declared before `window` so it is dropped first
    controller: LifecycleController<P>,
    /// Back buffer bookkeeping
    source: WindowImageSource,
    /// Frame notifications
    frames: FrameClock,
    /// Host window
    window: Option<Window>,
    title: String,
}

impl<P: SurfaceProvider> BridgeShell<P> {
    pub fn new(config: &BridgeConfig, provider: P) -> Self {
        let size = config.size();
        Self {
            controller: LifecycleController::new(provider, size),
            source: WindowImageSource::new(size),
            frames: FrameClock::new(),
            window: None,
            title: config.title.clone(),
        }
    }

    fn window_ready(&mut self, identity: WindowIdentity) {
        self.controller
            .on_window_ready(identity, &mut self.source, &mut self.frames);
    }

    fn set_front_buffer_available(&mut self, available: bool) {
        if self.source.set_front_buffer_available(available) {
            self.controller
                .on_availability_changed(&mut self.source, &mut self.frames);
        }
    }

    fn deliver_frame(&mut self) -> FrameOutcome {
        if !self.frames.is_subscribed() {
            return FrameOutcome::Idle;
        }
        let outcome = self.controller.on_frame(&mut self.source);
        self.source.present();
        outcome
    }

    fn shutdown(&mut self) {
        self.controller.shutdown(&mut self.source, &mut self.frames);
        let stats = self.controller.stats();
        info!(
            "Shut down after {} frames ({} skipped, {} surfaces created)",
            stats.frames_rendered,
            stats.frames_skipped,
            stats.initializations - stats.creation_failures
        );
    }
}

impl<P: SurfaceProvider> ApplicationHandler for BridgeShell<P> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            self.set_front_buffer_available(true);
            return;
        }

        let size = self.controller.size();
        let attrs = WindowAttributes::default()
            .with_title(self.title.clone())
            .with_inner_size(PhysicalSize::new(size.width as u32, size.height as u32));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => window,
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        info!("Window created");

        match WindowIdentity::from_window(&window) {
            Ok(identity) => {
                self.window = Some(window);
                self.window_ready(identity);
            }
            Err(e) => {
                error!("Window has no native handle: {}", e);
                event_loop.exit();
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.set_front_buffer_available(false);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Window close requested");
                self.shutdown();
                event_loop.exit();
            }

            WindowEvent::Occluded(occluded) => {
                debug!("Window occluded: {}", occluded);
                self.set_front_buffer_available(!occluded);
            }

            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.controller.on_resize(width, height);
            }

            WindowEvent::RedrawRequested => {
                self.deliver_frame();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.frames.is_subscribed() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            event_loop.set_control_flow(ControlFlow::Poll);
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // No-op if close already released the surface
        self.controller.shutdown(&mut self.source, &mut self.frames);
    }
}

/// Run the host window until it is closed
pub fn run<P: SurfaceProvider>(config: &BridgeConfig, provider: P) -> anyhow::Result<()> {
    info!("Starting host shell ({}x{})", config.width, config.height);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut shell = BridgeShell::new(config, provider);
    event_loop.run_app(&mut shell)?;

    Ok(())
}
