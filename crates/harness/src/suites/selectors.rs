//! Page selectors the built-in suites depend on
//!
//! These are a contract with the site's markup. A redesign that renames a
//! class or restructures a region must update this file in the same change.

/// Hero banner, the first section on the homepage.
pub const HERO: &str = "section";

/// Site-wide navigation header.
pub const HEADER: &str = "header";

/// Site-wide footer.
pub const FOOTER: &str = "footer";

/// Any form on the page. Optional content; tests skip when absent.
pub const FORM: &str = "form";

/// Program cards grid on the homepage.
pub const PROGRAMS_GRID: &str = ".programs-grid";

/// Hamburger button, shown below the navigation breakpoint (<= 1023px).
pub const MOBILE_MENU_TOGGLE: &str = ".mobile-menu-toggle";

/// Full link row, shown at and above the navigation breakpoint (>= 1024px).
pub const DESKTOP_NAV: &str = ".desktop-nav";
