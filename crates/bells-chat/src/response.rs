//! Response rendering from template ids.
//!
//! Every supported intent maps to a static, hand-authored
//! [`ResponseDocument`]. All branching has already happened in the matcher;
//! the renderer is a lookup with a `Default` fallback.

use std::collections::HashMap;

use bells_core::types::ResponseDocument;

use crate::matcher::TemplateId;

/// Turns a classified intent into a response document.
pub trait ResponseRenderer: Send + Sync {
    fn render(&self, template: TemplateId) -> ResponseDocument;
}

// =============================================================================
// TemplateLibrary
// =============================================================================

/// Canned renderer backed by a template table.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    templates: HashMap<TemplateId, ResponseDocument>,
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::campus()
    }
}

impl TemplateLibrary {
    /// An empty library; every lookup falls back to the built-in default.
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// The campus assistant templates.
    pub fn campus() -> Self {
        let mut library = Self::empty();
        library.insert(TemplateId::LibraryHours, library_hours());
        library.insert(TemplateId::Events, events());
        library.insert(TemplateId::Registrar, registrar());
        library.insert(TemplateId::Wifi, wifi());
        library.insert(TemplateId::Default, capability_overview());
        library
    }

    /// Add or replace the template for `id`.
    pub fn insert(&mut self, id: TemplateId, document: ResponseDocument) {
        self.templates.insert(id, document);
    }

    pub fn contains(&self, id: TemplateId) -> bool {
        self.templates.contains_key(&id)
    }
}

impl ResponseRenderer for TemplateLibrary {
    fn render(&self, template: TemplateId) -> ResponseDocument {
        self.templates
            .get(&template)
            .or_else(|| self.templates.get(&TemplateId::Default))
            .cloned()
            .unwrap_or_else(capability_overview)
    }
}

// =============================================================================
// Campus templates
// =============================================================================

pub const LIBRARY_HOURS_TITLE: &str = "Main Library Hours";
pub const EVENTS_TITLE: &str = "This Week's Events";
pub const REGISTRAR_TITLE: &str = "Office Information";
pub const WIFI_TITLE: &str = "WiFi Connection Guide";
pub const CAPABILITIES_TITLE: &str = "What I Can Help With";

fn library_hours() -> ResponseDocument {
    ResponseDocument::new()
        .paragraph("The Main Library is open until 10:00 PM today.")
        .info_card(
            LIBRARY_HOURS_TITLE,
            "book",
            [
                "Mon-Thu: 7:00 AM - 10:00 PM",
                "Fri: 7:00 AM - 6:00 PM",
                "Sat-Sun: 9:00 AM - 5:00 PM",
                "24-hour study room: always open",
            ],
        )
        .hint("The 24-hour study room is always available!")
}

fn events() -> ResponseDocument {
    ResponseDocument::new()
        .paragraph("Here are the upcoming events this week:")
        .info_card(
            EVENTS_TITLE,
            "calendar-alt",
            [
                "Tuesday, 3:00 PM: Tech Career Fair - Student Center",
                "Wednesday, 6:00 PM: AI Workshop - Lab 204",
                "Thursday, 2:00 PM: Student Council - Building A",
                "Friday, 7:00 PM: Jazz Night - Campus Auditorium",
            ],
        )
        .hint("Register at the student portal!")
}

fn registrar() -> ResponseDocument {
    ResponseDocument::new()
        .paragraph(
            "The Registrar's Office is located in Administration Building, Room 105.",
        )
        .info_card(
            REGISTRAR_TITLE,
            "door-open",
            [
                "Hours: Mon-Fri, 8:00 AM - 5:00 PM",
                "Phone: (555) 123-4567",
                "Email: registrar@university.edu",
            ],
        )
}

fn wifi() -> ResponseDocument {
    ResponseDocument::new()
        .paragraph("To connect to campus WiFi, follow these steps:")
        .info_card(
            WIFI_TITLE,
            "wifi",
            [
                "1. Select \"Campus-WiFi\" network",
                "2. Enter your student ID",
                "3. Use your portal password",
                "4. Accept the terms of service",
            ],
        )
        .hint("For issues, contact IT Help Desk at ext. 2000")
}

/// Generic overview used for unmatched queries.
pub fn capability_overview() -> ResponseDocument {
    ResponseDocument::new()
        .paragraph(
            "Thank you for your question! I'm here to help you with information about:",
        )
        .info_card(
            CAPABILITIES_TITLE,
            "info-circle",
            [
                "Academic schedules and course information",
                "Department locations and contact details",
                "Campus events and activities",
                "Facilities and services",
            ],
        )
        .hint("Try asking about library hours, upcoming events, or department locations!")
}

/// Shown in place of an answer when the response backend fails.
pub fn backend_fallback() -> ResponseDocument {
    ResponseDocument::new()
        .paragraph("Sorry, I couldn't get an answer right now.")
        .hint("Please try again in a moment.")
}

// =============================================================================
// Tests
// =============================================================================
