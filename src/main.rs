//! School Records entry point
//!
//! On the web this wires forms, panels and the tenant picker to a session
//! backed by LocalStorage. Natively it runs a short demo against memory.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        Document, Element, HtmlAnchorElement, HtmlFormElement, HtmlInputElement,
        HtmlSelectElement,
    };

    use school_records::forms::{CourseForm, EnrolmentForm, FeeForm, ResultForm, StaffForm};
    use school_records::platform::LocalStorage;
    use school_records::ui;
    use school_records::{Export, Session, SessionError, StoreSettings, Submission};

    type App = Rc<RefCell<Session<LocalStorage>>>;

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn by_id(id: &str) -> Option<Element> {
        document()?.get_element_by_id(id)
    }

    /// Value of the named input or select inside a form
    fn field(form: &Element, name: &str) -> String {
        let Ok(Some(el)) = form.query_selector(&format!("[name=\"{}\"]", name)) else {
            return String::new();
        };
        if let Some(input) = el.dyn_ref::<HtmlInputElement>() {
            return input.value();
        }
        if let Some(select) = el.dyn_ref::<HtmlSelectElement>() {
            return select.value();
        }
        String::new()
    }

    fn show_panel(name: &str) {
        let Some(document) = document() else {
            return;
        };
        if let Ok(panels) = document.query_selector_all(".panel") {
            for i in 0..panels.length() {
                if let Some(el) = panels.get(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                    let _ = el.class_list().add_1("hidden");
                }
            }
        }
        if let Some(el) = document.get_element_by_id(name) {
            let _ = el.class_list().remove_1("hidden");
        }
    }

    fn render_tenant_controls(session: &Session<LocalStorage>) {
        if let Some(el) = by_id("tenantSelect") {
            el.set_inner_html(&ui::tenant_options(&session.tenants()));
            if let (Some(select), Some(id)) = (
                el.dyn_ref::<HtmlSelectElement>(),
                session.namespace().tenant_id(),
            ) {
                select.set_value(id);
            }
        }
        if let Some(el) = by_id("currentTenantName") {
            let label = ui::current_tenant_label(session.current_tenant().as_ref());
            el.set_text_content(Some(&label));
        }
    }

    fn render_lists(session: &Session<LocalStorage>) {
        let panels = ui::render_panels(session.state());
        for (id, html) in panels.by_element_id() {
            if let Some(el) = by_id(id) {
                el.set_inner_html(html);
            }
        }

        let options = ui::student_options(&session.state().students);
        for id in ["feeStudent", "resultStudent"] {
            if let Some(el) = by_id(id) {
                el.set_inner_html(&options);
            }
        }
    }

    /// Offer a file as a download through a temporary object URL
    fn download(export: &Export) -> Result<(), JsValue> {
        let document = document().ok_or_else(|| JsValue::from_str("no document"))?;

        let parts = js_sys::Array::of1(&JsValue::from_str(&export.contents));
        let options = web_sys::BlobPropertyBag::new();
        options.set_type(export.mime);
        let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
        let url = web_sys::Url::create_object_url_with_blob(&blob)?;

        let anchor = document
            .create_element("a")?
            .dyn_into::<HtmlAnchorElement>()
            .map_err(JsValue::from)?;
        anchor.set_href(&url);
        anchor.set_download(&export.file_name);
        anchor.click();
        web_sys::Url::revoke_object_url(&url)?;
        Ok(())
    }

    fn on_submit<F>(app: &App, form_id: &str, handle: F)
    where
        F: Fn(&mut Session<LocalStorage>, &Element) -> Result<Submission, SessionError> + 'static,
    {
        let Some(form) = by_id(form_id) else {
            log::warn!("Form '{}' not found", form_id);
            return;
        };
        let app = app.clone();
        let target = form.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
            event.prevent_default();
            let mut session = app.borrow_mut();
            match handle(&mut *session, &target) {
                Ok(Submission::Recorded) => {
                    if let Some(form) = target.dyn_ref::<HtmlFormElement>() {
                        form.reset();
                    }
                    render_lists(&session);
                }
                Ok(Submission::Dropped) => {}
                Err(e) => log::error!("Submission failed: {}", e),
            }
        });
        let _ = form.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_forms(app: &App) {
        on_submit(app, "enrolForm", |session, f| {
            session.enrol(EnrolmentForm {
                name: field(f, "name"),
                student_id: field(f, "studentId"),
                class_name: field(f, "className"),
            })
        });
        on_submit(app, "feeForm", |session, f| {
            session.record_fee(FeeForm {
                student_id: field(f, "studentId"),
                amount: field(f, "amount"),
                date: field(f, "date"),
            })
        });
        on_submit(app, "courseForm", |session, f| {
            session.add_course(CourseForm {
                code: field(f, "code"),
                title: field(f, "title"),
            })
        });
        on_submit(app, "staffForm", |session, f| {
            session.add_staff(StaffForm {
                name: field(f, "name"),
                role: field(f, "role"),
            })
        });
        on_submit(app, "resultForm", |session, f| {
            session.record_result(ResultForm {
                student_id: field(f, "studentId"),
                course: field(f, "course"),
                grade: field(f, "grade"),
            })
        });
    }

    fn setup_export(app: &App) {
        let Some(btn) = by_id("exportResults") else {
            return;
        };
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let export = match app.borrow().export_results() {
                Ok(export) => export,
                Err(e) => {
                    log::error!("Export failed: {}", e);
                    return;
                }
            };
            match download(&export) {
                Ok(()) => log::info!("Exported {}", export.file_name),
                Err(e) => log::error!("Download failed: {:?}", e),
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_navigation() {
        let Some(buttons) = document().and_then(|d| d.query_selector_all("nav button").ok())
        else {
            return;
        };
        for i in 0..buttons.length() {
            let Some(btn) = buttons.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            let Some(target) = btn.get_attribute("data-target") else {
                continue;
            };
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                show_panel(&target);
            });
            let _ =
                btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_tenant_controls(app: &App) {
        // Create button
        if let Some(btn) = by_id("createTenant") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let Some(input) = by_id("newTenantName")
                    .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                else {
                    return;
                };
                let name = input.value();
                if name.trim().is_empty() {
                    return;
                }
                let mut session = app.borrow_mut();
                match session.create_tenant(&name) {
                    Ok(_) => {
                        input.set_value("");
                        render_tenant_controls(&session);
                        render_lists(&session);
                    }
                    Err(e) => log::error!("Could not create tenant: {}", e),
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Picker
        if let Some(select) = by_id("tenantSelect") {
            let app = app.clone();
            let picker = select.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let Some(id) = picker.dyn_ref::<HtmlSelectElement>().map(|s| s.value()) else {
                    return;
                };
                let mut session = app.borrow_mut();
                if let Err(e) = session.switch_tenant(&id) {
                    log::error!("Could not switch tenant: {}", e);
                }
                render_tenant_controls(&session);
                render_lists(&session);
            });
            let _ =
                select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("School Records starting...");

        let Some(storage) = LocalStorage::open() else {
            log::error!("LocalStorage is not available");
            return;
        };
        let session = match Session::multi_tenant(storage, StoreSettings::default()) {
            Ok(session) => session,
            Err(e) => {
                log::error!("Could not open session: {}", e);
                return;
            }
        };
        let app: App = Rc::new(RefCell::new(session));

        setup_forms(&app);
        setup_export(&app);
        setup_navigation();
        setup_tenant_controls(&app);

        let session = app.borrow();
        render_tenant_controls(&session);
        render_lists(&session);

        log::info!("School Records running!");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("School Records (native) starting...");
    log::info!("Native mode keeps records in memory - build for wasm32 to use LocalStorage");

    if let Err(e) = demo() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Walk one school through every form and print its results export
#[cfg(not(target_arch = "wasm32"))]
fn demo() -> Result<(), school_records::SessionError> {
    use school_records::forms::{CourseForm, EnrolmentForm, FeeForm, ResultForm, StaffForm};
    use school_records::{MemoryStore, Session, StoreSettings};

    let mut session = Session::multi_tenant(MemoryStore::new(), StoreSettings::default())?;
    let tenant = session.create_tenant("St. Mary's School!")?;
    log::info!("Active tenant: {:?}", tenant);

    session.enrol(EnrolmentForm {
        name: "Ada Lovelace".into(),
        student_id: "S001".into(),
        class_name: "Year 5".into(),
    })?;
    session.record_fee(FeeForm {
        student_id: "S001".into(),
        amount: "250.00".into(),
        date: "2024-01-15".into(),
    })?;
    session.add_course(CourseForm {
        code: "MTH101".into(),
        title: "Mathematics".into(),
    })?;
    session.add_staff(StaffForm {
        name: "Grace Hopper".into(),
        role: "Head Teacher".into(),
    })?;
    session.record_result(ResultForm {
        student_id: "S001".into(),
        course: "MTH101".into(),
        grade: "A".into(),
    })?;

    for tenant in session.tenants() {
        log::info!("Tenant {} ({})", tenant.id, tenant.name);
    }

    let export = session.export_results()?;
    println!("\n{}:\n{}", export.file_name, export.contents);
    Ok(())
}
