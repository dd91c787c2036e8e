use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;

use crate::api::{attendance, employee, nfc, scan, ws};
use crate::config::Config;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-scope limiter config
    fn limiter_config(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let scan_limiter = limiter_config(config.rate_scan_per_min);
    let api_limiter = limiter_config(config.rate_api_per_min);

    // Dashboard observers (not rate limited; long-lived)
    cfg.service(web::resource("/ws").route(web::get().to(ws::attendance_events)));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Governor::new(&api_limiter))
            .service(
                web::scope("/nfc")
                    // /nfc/scan — the badge terminal endpoint, own budget
                    .service(
                        web::resource("/scan")
                            .wrap(Governor::new(&scan_limiter))
                            .route(web::post().to(scan::nfc_scan)),
                    )
                    // /nfc/link
                    .service(web::resource("/link").route(web::post().to(nfc::link_card))),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    // /attendance/in-office
                    .service(
                        web::resource("/in-office").route(web::get().to(attendance::in_office)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(attendance::update_attendance)),
                    ),
            )
            .service(
                web::scope("/employees").service(
                    web::resource("")
                        .route(web::get().to(employee::list_employees))
                        .route(web::post().to(employee::create_employee)),
                ),
            ),
    );
}
