// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `{{placeholder}}` substitution for message template bodies.

use chrono::NaiveDate;

/// Values available to a template body.
#[derive(Debug, Clone)]
pub struct TemplateContext<'a> {
    pub guest_name: &'a str,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub property_name: &'a str,
}

/// Render `body` with the context's values.
///
/// Placeholders that are not known keys pass through unchanged, so a typo
/// is visible in the sent message instead of silently vanishing.
pub fn render(body: &str, ctx: &TemplateContext<'_>) -> String {
    body.replace("{{guest_name}}", ctx.guest_name)
        .replace("{{check_in_date}}", &ctx.check_in_date.to_string())
        .replace("{{check_out_date}}", &ctx.check_out_date.to_string())
        .replace("{{property_name}}", ctx.property_name)
}
