#![cfg_attr(windows, windows_subsystem = "windows")]

//! Binary entry point.
//!
//! Owns the Win32 message loop and routes OS events into the library:
//! `WM_HOTKEY` into the hotkey manager, `WM_TIMER` into the indicator, and
//! a private toggle message from the hotkey handler back onto the loop so
//! the handler never re-enters application state.

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    win::run()
}

#[cfg(not(windows))]
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    anyhow::bail!("mic-mute-rs only runs on Windows; the library targets any platform")
}

#[cfg(windows)]
mod win {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use std::time::Duration;

    use anyhow::Context;
    use tracing::{info, warn};

    use windows::core::w;
    use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
    use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DispatchMessageW, GetMessageW, KillTimer,
        PostMessageW, PostQuitMessage, RegisterClassExW, SetTimer, TranslateMessage,
        CW_USEDEFAULT, MSG, WINDOW_EX_STYLE, WM_DESTROY, WM_HOTKEY, WM_TIMER, WM_USER,
        WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
    };

    use mic_mute_rs::hotkeys::windows::WindowsHotkeyBackend;
    use mic_mute_rs::hotkeys::SIGNATURE;
    use mic_mute_rs::indicator::overlay::LayeredOverlay;
    use mic_mute_rs::indicator::{IndicatorTimer, TimerHost};
    use mic_mute_rs::platform::RegistryPreferences;
    use mic_mute_rs::{App, HotkeyManager, IndicatorController, IndicatorStatus};

    use mic_mute_rs::audio::wasapi::WasapiBackend;

    const WM_TOGGLE_MUTE: u32 = WM_USER + 1;

    /// Timers scheduled through `SetTimer` on the message window.
    #[derive(Clone)]
    struct MessageTimers {
        hwnd: HWND,
        pending: Rc<RefCell<HashMap<usize, IndicatorTimer>>>,
        next_id: Rc<RefCell<usize>>,
    }

    impl MessageTimers {
        fn new(hwnd: HWND) -> Self {
            Self {
                hwnd,
                pending: Rc::new(RefCell::new(HashMap::new())),
                next_id: Rc::new(RefCell::new(1)),
            }
        }

        fn take(&self, timer_id: usize) -> Option<IndicatorTimer> {
            unsafe {
                let _ = KillTimer(self.hwnd, timer_id);
            }
            self.pending.borrow_mut().remove(&timer_id)
        }
    }

    impl TimerHost for MessageTimers {
        fn schedule(&mut self, delay: Duration, timer: IndicatorTimer) {
            let mut next = self.next_id.borrow_mut();
            let id = *next;
            *next = next.wrapping_add(1).max(1);
            self.pending.borrow_mut().insert(id, timer);
            unsafe {
                SetTimer(self.hwnd, id, delay.as_millis() as u32, None);
            }
        }
    }

    struct AppContext {
        app: App<WasapiBackend, RegistryPreferences>,
        hotkeys: HotkeyManager<WindowsHotkeyBackend>,
        indicator: IndicatorController<LayeredOverlay, MessageTimers>,
        timers: MessageTimers,
    }

    impl AppContext {
        fn toggle_and_notify(&mut self) {
            let muted = self.app.toggle_mute();
            let status = if muted {
                IndicatorStatus::Off
            } else {
                IndicatorStatus::On
            };
            self.indicator.show(status);
        }
    }

    thread_local! {
        static APP_CONTEXT: RefCell<Option<AppContext>> = const { RefCell::new(None) };
    }

    fn with_context<F, R>(f: F) -> Option<R>
    where
        F: FnOnce(&mut AppContext) -> R,
    {
        APP_CONTEXT.with(|ctx| ctx.borrow_mut().as_mut().map(f))
    }

    pub fn run() -> anyhow::Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();

        unsafe {
            CoInitializeEx(None, COINIT_APARTMENTTHREADED)
                .ok()
                .context("COM init failed")?;
        }

        let result = run_message_loop();

        unsafe {
            CoUninitialize();
        }
        result
    }

    fn run_message_loop() -> anyhow::Result<()> {
        unsafe {
            let instance = GetModuleHandleW(None)?;
            let window_class = w!("MicMuteWindow");

            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                lpfnWndProc: Some(window_proc),
                hInstance: instance.into(),
                lpszClassName: window_class,
                ..Default::default()
            };
            RegisterClassExW(&wc);

            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                window_class,
                w!("Mic Mute"),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                None,
                None,
                instance,
                None,
            )?;

            let backend = WasapiBackend::new().context("audio backend init failed")?;
            let app = App::new(backend, RegistryPreferences::new());

            let timers = MessageTimers::new(hwnd);
            let overlay = LayeredOverlay::new().context("indicator overlay init failed")?;
            let indicator = IndicatorController::new(overlay, timers.clone());

            let mut hotkeys = HotkeyManager::new(WindowsHotkeyBackend::new(hwnd));
            let shortcuts = app.shortcuts().to_vec();
            if let Err(e) = hotkeys.register(&shortcuts, move || {
                // Post back onto the loop instead of touching state from
                // inside dispatch.
                let _ = PostMessageW(hwnd, WM_TOGGLE_MUTE, WPARAM(0), LPARAM(0));
            }) {
                // The toggle stays reachable from the UI; keep running.
                warn!(error = %e, "hotkey registration incomplete");
            }

            info!(muted = app.is_muted(), "mic-mute-rs started");

            APP_CONTEXT.with(|ctx| {
                *ctx.borrow_mut() = Some(AppContext {
                    app,
                    hotkeys,
                    indicator,
                    timers,
                })
            });

            let mut msg = MSG::default();
            while GetMessageW(&mut msg, None, 0, 0).into() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }

            APP_CONTEXT.with(|ctx| ctx.borrow_mut().take());
        }
        Ok(())
    }

    unsafe extern "system" fn window_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_HOTKEY => {
                let registration_id = wparam.0 as u32;
                with_context(|ctx| ctx.hotkeys.dispatch(SIGNATURE, registration_id));
                LRESULT(0)
            }
            WM_TOGGLE_MUTE => {
                with_context(|ctx| ctx.toggle_and_notify());
                LRESULT(0)
            }
            WM_TIMER => {
                let timer_id = wparam.0;
                with_context(|ctx| {
                    if let Some(timer) = ctx.timers.take(timer_id) {
                        ctx.indicator.handle_timer(timer);
                    }
                });
                LRESULT(0)
            }
            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}
