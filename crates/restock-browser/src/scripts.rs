//! In-page script bodies shared by the WebDriver adapter and the scripted mock.

pub const IS_VISIBLE: &str = "const e = arguments[0]; \
const s = window.getComputedStyle(e); \
return s.display !== 'none' && s.visibility !== 'hidden' && e.offsetParent !== null;";

pub const IS_CLICKABLE: &str = "const e = arguments[0]; \
const s = window.getComputedStyle(e); \
return s.display !== 'none' && s.visibility !== 'hidden' && e.offsetParent !== null \
  && !e.disabled;";

pub const SCROLL_INTO_VIEW: &str =
    "arguments[0].scrollIntoView({block: 'center'}); return null;";

pub const CLICK: &str = "arguments[0].click(); return null;";

pub const SET_VALUE_AND_DISPATCH: &str = "const e = arguments[0]; \
e.value = arguments[1]; \
e.dispatchEvent(new Event('input', { bubbles: true })); \
e.dispatchEvent(new Event('change', { bubbles: true })); \
return null;";
