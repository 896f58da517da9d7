//! Layered-window overlay surface.
//!
//! A borderless, topmost, click-through popup anchored to the top center
//! of the monitor under the cursor. Opacity goes through
//! `SetLayeredWindowAttributes`; fades apply their target alpha directly
//! and the controller's timers carry the animation durations.

use std::time::Duration;

use windows::core::{w, Result};
use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    BeginPaint, CreateSolidBrush, DeleteObject, DrawTextW, EndPaint, FillRect, GetMonitorInfoW,
    InvalidateRect, MonitorFromPoint, SetBkMode, SetTextColor, DT_CENTER, DT_SINGLELINE,
    DT_VCENTER, MONITORINFO, MONITOR_DEFAULTTONEAREST, PAINTSTRUCT, TRANSPARENT,
};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, GetCursorPos, GetWindowTextW,
    RegisterClassExW, SetLayeredWindowAttributes, SetWindowPos, SetWindowTextW, ShowWindow,
    CS_HREDRAW, CS_VREDRAW, HWND_TOPMOST, LWA_ALPHA, SWP_NOACTIVATE, SWP_NOSIZE, SWP_NOZORDER,
    SW_HIDE, SW_SHOWNOACTIVATE, WM_PAINT, WNDCLASSEXW, WS_EX_LAYERED, WS_EX_NOACTIVATE,
    WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};

use super::super::{IndicatorStatus, OverlaySurface};

const WIDTH: i32 = 96;
const HEIGHT: i32 = 48;
const TOP_MARGIN: i32 = 14;

/// Overlay window backed by a Win32 layered popup.
pub struct LayeredOverlay {
    hwnd: HWND,
}

impl LayeredOverlay {
    pub fn new() -> Result<Self> {
        unsafe {
            let instance = GetModuleHandleW(None)?;
            let class_name = w!("MicMuteIndicator");

            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(overlay_proc),
                hInstance: instance.into(),
                lpszClassName: class_name,
                ..Default::default()
            };
            RegisterClassExW(&wc);

            let hwnd = CreateWindowExW(
                WS_EX_LAYERED | WS_EX_TOPMOST | WS_EX_TOOLWINDOW | WS_EX_NOACTIVATE
                    | WS_EX_TRANSPARENT,
                class_name,
                w!("ON"),
                WS_POPUP,
                0,
                0,
                WIDTH,
                HEIGHT,
                None,
                None,
                instance,
                None,
            )?;

            SetLayeredWindowAttributes(hwnd, COLORREF(0), 255, LWA_ALPHA)?;
            Ok(Self { hwnd })
        }
    }
}

impl OverlaySurface for LayeredOverlay {
    fn apply_status(&mut self, status: IndicatorStatus) {
        let label = match status {
            IndicatorStatus::On => w!("ON"),
            IndicatorStatus::Off => w!("OFF"),
        };
        unsafe {
            let _ = SetWindowTextW(self.hwnd, label);
            let _ = InvalidateRect(self.hwnd, None, true);
        }
    }

    fn move_to_pointer_screen(&mut self) {
        unsafe {
            let mut cursor = POINT::default();
            if GetCursorPos(&mut cursor).is_err() {
                return;
            }
            let monitor = MonitorFromPoint(cursor, MONITOR_DEFAULTTONEAREST);
            let mut info = MONITORINFO {
                cbSize: std::mem::size_of::<MONITORINFO>() as u32,
                ..Default::default()
            };
            if !GetMonitorInfoW(monitor, &mut info).as_bool() {
                return;
            }

            let work = info.rcWork;
            let x = work.left + (work.right - work.left - WIDTH) / 2;
            let y = work.top + TOP_MARGIN;
            let _ = SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                x,
                y,
                0,
                0,
                SWP_NOSIZE | SWP_NOACTIVATE | SWP_NOZORDER,
            );
        }
    }

    fn set_opacity(&mut self, opacity: f32, _fade: Duration) {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        unsafe {
            let _ = SetLayeredWindowAttributes(self.hwnd, COLORREF(0), alpha, LWA_ALPHA);
        }
    }

    fn order_front(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOWNOACTIVATE);
        }
    }

    fn order_out(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_HIDE);
        }
    }
}

impl Drop for LayeredOverlay {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

unsafe extern "system" fn overlay_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if msg == WM_PAINT {
        let mut ps = PAINTSTRUCT::default();
        let hdc = BeginPaint(hwnd, &mut ps);

        let background = CreateSolidBrush(COLORREF(0x002b_2b2b));
        FillRect(hdc, &ps.rcPaint, background);
        let _ = DeleteObject(background);

        let mut text = [0u16; 8];
        let len = GetWindowTextW(hwnd, &mut text) as usize;
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: WIDTH,
            bottom: HEIGHT,
        };
        SetBkMode(hdc, TRANSPARENT);
        SetTextColor(hdc, COLORREF(0x00f2_f2f2));
        DrawTextW(
            hdc,
            &mut text[..len],
            &mut rect,
            DT_CENTER | DT_VCENTER | DT_SINGLELINE,
        );

        let _ = EndPaint(hwnd, &ps);
        return LRESULT(0);
    }
    DefWindowProcW(hwnd, msg, wparam, lparam)
}
