use std::sync::mpsc::{Receiver, TryIter};

use crate::alarm::AlarmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Locked,
    Unlocked,
}

/// Lock/unlock events from the OS session, handed over a channel so the
/// scheduler only ever applies them from its own evaluation context. The
/// watcher thread owns no alarm state.
pub struct SessionWatcher {
    receiver: Receiver<SessionEvent>,
}

impl SessionWatcher {
    /// Starts the platform watcher. Fails with `SignalSourceUnavailable`
    /// where the OS offers no session notifications; callers disable the
    /// pause-on-lock feature in that case.
    pub fn spawn() -> Result<Self, AlarmError> {
        platform::spawn()
    }

    /// True when this build can watch session lock state at all.
    pub fn is_supported() -> bool {
        cfg!(windows)
    }

    /// Drains events accumulated since the last call, oldest first.
    pub fn try_iter(&self) -> TryIter<'_, SessionEvent> {
        self.receiver.try_iter()
    }
}

#[cfg(windows)]
mod platform {
    use std::sync::Mutex;
    use std::sync::mpsc::{Sender, channel};
    use std::thread;

    use windows_sys::Win32::Foundation::{HWND, LPARAM, LRESULT, WPARAM};
    use windows_sys::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows_sys::Win32::System::RemoteDesktop::{
        WTSRegisterSessionNotification, WTSUnRegisterSessionNotification,
    };
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DispatchMessageW, GetMessageW, MSG, PostQuitMessage,
        RegisterClassW, TranslateMessage, WM_DESTROY, WNDCLASSW,
    };

    use super::{SessionEvent, SessionWatcher};
    use crate::alarm::AlarmError;

    // Session-change message and wParam codes, per wtsapi32.
    const WM_WTSSESSION_CHANGE: u32 = 0x02B1;
    const WTS_SESSION_LOCK: WPARAM = 0x7;
    const WTS_SESSION_UNLOCK: WPARAM = 0x8;
    const NOTIFY_FOR_THIS_SESSION: u32 = 0;

    // The wndproc cannot carry state, so the channel sender lives here. At
    // most one watcher runs per process.
    static EVENTS: Mutex<Option<Sender<SessionEvent>>> = Mutex::new(None);

    pub fn spawn() -> Result<SessionWatcher, AlarmError> {
        let (sender, receiver) = channel();
        match EVENTS.lock() {
            Ok(mut guard) => *guard = Some(sender),
            Err(_) => {
                return Err(AlarmError::SignalSourceUnavailable(
                    "session watcher state poisoned".to_string(),
                ));
            }
        }
        thread::Builder::new()
            .name("session-watcher".to_string())
            .spawn(run_message_pump)
            .map_err(|err| {
                AlarmError::SignalSourceUnavailable(format!(
                    "cannot start watcher thread: {err}"
                ))
            })?;
        Ok(SessionWatcher { receiver })
    }

    fn deliver(event: SessionEvent) {
        if let Ok(guard) = EVENTS.lock()
            && let Some(sender) = guard.as_ref()
        {
            let _ = sender.send(event);
        }
    }

    unsafe extern "system" fn session_wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_WTSSESSION_CHANGE => {
                match wparam {
                    WTS_SESSION_LOCK => deliver(SessionEvent::Locked),
                    WTS_SESSION_UNLOCK => deliver(SessionEvent::Unlocked),
                    _ => {}
                }
                0
            }
            WM_DESTROY => {
                unsafe { PostQuitMessage(0) };
                0
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    /// Hidden window whose only job is receiving WM_WTSSESSION_CHANGE; the
    /// pump runs for the life of the process.
    fn run_message_pump() {
        let class_name: Vec<u16> = "DayStarterSessionWatcher\0".encode_utf16().collect();
        unsafe {
            let instance = GetModuleHandleW(std::ptr::null());
            let mut class: WNDCLASSW = std::mem::zeroed();
            class.lpfnWndProc = Some(session_wndproc);
            class.hInstance = instance;
            class.lpszClassName = class_name.as_ptr();
            if RegisterClassW(&class) == 0 {
                log::warn!("session watcher window class registration failed");
                return;
            }
            let hwnd = CreateWindowExW(
                0,
                class_name.as_ptr(),
                class_name.as_ptr(),
                0,
                0,
                0,
                0,
                0,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                instance,
                std::ptr::null(),
            );
            if hwnd.is_null() {
                log::warn!("session watcher window creation failed");
                return;
            }
            if WTSRegisterSessionNotification(hwnd, NOTIFY_FOR_THIS_SESSION) == 0 {
                log::warn!("session change notification registration failed");
                return;
            }
            let mut msg: MSG = std::mem::zeroed();
            while GetMessageW(&mut msg, std::ptr::null_mut(), 0, 0) > 0 {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            WTSUnRegisterSessionNotification(hwnd);
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use super::SessionWatcher;
    use crate::alarm::AlarmError;

    pub fn spawn() -> Result<SessionWatcher, AlarmError> {
        Err(AlarmError::SignalSourceUnavailable(
            "session lock events require the Windows session API".to_string(),
        ))
    }
}
