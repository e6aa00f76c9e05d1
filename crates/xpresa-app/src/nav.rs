// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ALL_FILTER, Location, STATUS_PARAM};

pub const DASHBOARD_PATH: &str = "/dashboard";
pub const EXPENSES_PATH: &str = "/gastos";
pub const NEW_ORDER_PATH: &str = "/nuevo-pedido";
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIcon {
    Clock,
    File,
    Truck,
    List,
    Plus,
    Receipt,
}

impl NavIcon {
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Clock => "◷",
            Self::File => "▤",
            Self::Truck => "⛟",
            Self::List => "≡",
            Self::Plus => "+",
            Self::Receipt => "$",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavTarget {
    pub href: &'static str,
    pub label: &'static str,
    pub icon: NavIcon,
}

/// Sidebar entries. Each distinct path+filter pair appears once.
pub static NAV_TARGETS: [NavTarget; 6] = [
    NavTarget {
        href: "/dashboard?status=pendiente",
        label: "Pendientes",
        icon: NavIcon::Clock,
    },
    NavTarget {
        href: "/dashboard?status=cotizado",
        label: "Cotizados",
        icon: NavIcon::File,
    },
    NavTarget {
        href: "/dashboard?status=enviado",
        label: "Enviados",
        icon: NavIcon::Truck,
    },
    NavTarget {
        href: "/dashboard?status=all",
        label: "Todos",
        icon: NavIcon::List,
    },
    NavTarget {
        href: NEW_ORDER_PATH,
        label: "Nuevo Pedido",
        icon: NavIcon::Plus,
    },
    NavTarget {
        href: EXPENSES_PATH,
        label: "Gastos",
        icon: NavIcon::Receipt,
    },
];

impl NavTarget {
    pub fn location(&self) -> Location {
        Location::parse(self.href).unwrap_or_else(|_| Location::new(self.href))
    }

    /// The filter string this target encodes, `"all"` when it has none.
    fn encoded_filter(location: &Location) -> &str {
        match location.query_param(STATUS_PARAM) {
            Some(value) if !value.is_empty() => value,
            _ => ALL_FILTER,
        }
    }

    pub fn is_active(&self, current_path: &str, current_filter: &str) -> bool {
        let location = self.location();
        if location.path() == DASHBOARD_PATH {
            current_path == DASHBOARD_PATH
                && Self::encoded_filter(&location) == current_filter
        } else {
            current_path == location.path()
        }
    }
}

/// The single highlighted sidebar entry for the given location, if any.
///
/// Dashboard targets need an exact filter-string match; other targets match
/// on path alone. There is no nearest-match fallback.
pub fn resolve_active<'a>(
    current_path: &str,
    current_filter: &str,
    targets: &'a [NavTarget],
) -> Option<&'a NavTarget> {
    targets
        .iter()
        .find(|target| target.is_active(current_path, current_filter))
}
