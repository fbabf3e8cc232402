/*!
# SM Dashboard Backend

A sales/quality reporting dashboard backend, built in Rust.

## Overview

The service reads rows from a small set of spreadsheet sheets (Google Sheets
value ranges), aggregates them into a role hierarchy (Senior Manager →
Manager → AM/FLAP, with Executive Managers tracked per SM in a parallel
list), and computes rollup metrics for three reporting windows: yesterday,
week-to-date, month-to-date. Everything is recomputed from source rows on
every request; nothing persists in-process.

## Architecture

The application follows a client-server architecture:

### API Layer
- **Technologies**: Rust, axum, tower-http
- **Key Components**:
  - Router and handlers - one JSON endpoint per report
  - Auth middleware - cookie-session gate over every data route
  - Sheets client - fetches named value ranges over HTTPS

### Aggregation Core
- **Core Components**:
  - Row Parser - total parsing of heterogeneous sheet cells
  - Entity Resolver - deterministic `(role, name)` → entity identity
  - Target Scaler - calendar-aware monthly → y/w/m sub-targets
  - Hierarchy Builder - SM → Manager → AM/FLAP tree with virtual managers
  - Metric Rollup Engine - summed achieved/target with recomputed pct
  - Filter Engines - underperformers, gap droughts, funnel ratios

Data flows one way: raw rows → normalized rows → resolved entities → scaled
targets → hierarchy edges → rolled-up metrics → threshold-filtered views.

## Key Features

- Revenue achieved vs. target per stream (service, commerce) at every level
- Weight-loss quality and CSAT/NPS metrics keyed by entity id
- Gap report with exclusion registry and joining floor
- Funnel tallies and conversion ratios per reporting window
- Cookie-session authentication with Argon2 credential verification

## Modules

- **rows**: raw row type, total parsers, per-sheet column layouts
- **entity**: roles, totals, entity resolution and the per-pass registry
- **targets**: monthly target proration
- **hierarchy**: reporting tree assembly
- **rollup**: metric math and the rolled-up revenue tree
- **quality**: weight-loss and customer-rating folds
- **funnel**: funnel tallies and derived ratios
- **gaps**: gap droughts and underperformer filters
- **report**: row-to-payload orchestration
- **config** / **error**: injected configuration and the failure taxonomy
- **sheets** / **login** / **app**: fetch, sessions, routing (web feature)

## REST API Endpoints

- `POST /api/login`, `POST /api/logout` - session management
- `GET /api/hierarchy` - flat entity lists with targets and achieved
- `GET /api/revenue` - rolled-up SM → Manager → AM/FLAP tree
- `GET /api/quality`, `GET /api/customer-rating` - entity-id-keyed metrics
- `GET /api/dietitian-gaps`, `GET /api/underperformers` - filtered views
- `GET /api/funnel` - funnel tallies and ratios for a `(name, role)` scope
- `GET /api/key-mapping`, `GET /api/data` - exclusion list, raw range dump
- `GET /api/cron/refresh-data` - bearer-secret liveness probe
*/

// Re-export all modules so they appear in the documentation
pub mod config;
pub mod entity;
pub mod error;
pub mod funnel;
pub mod gaps;
pub mod hierarchy;
pub mod quality;
pub mod report;
pub mod rollup;
pub mod rows;
pub mod targets;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod login;
#[cfg(feature = "web")]
pub mod sheets;

/// Re-export everything from the core modules to make it easier to use
pub use entity::*;
pub use error::*;
pub use funnel::*;
pub use gaps::*;
pub use hierarchy::*;
pub use quality::*;
pub use rollup::*;
pub use rows::*;
pub use targets::*;
