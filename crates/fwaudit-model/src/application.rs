//! Application atoms and their default-service sets.

use std::sync::Arc;

use biodivine_lib_bdd::Bdd;

use crate::atom::Atom;
use crate::domain::{DomainKind, Domains};
use crate::group::Group;
use crate::mvalue::Mvalue;
use crate::options::SharedOptions;
use crate::service::Service;

/// Marker name of the service group that stands in for the services a
/// rule's applications open when the rule uses application-default.
pub const APP_DEFAULT_SERVICES: &str = "$app-default-svc";

/// An application identified by a singleton id in the application domain.
///
/// `use_app_svc` couples the application with its intrinsic services: the
/// compiled condition then also requires one of the default services. With
/// application modeling switched off the id constraint vanishes and only
/// that service coupling remains.
#[derive(Debug, Clone)]
pub struct Application {
    name: String,
    value: Mvalue,
    options: SharedOptions,
    use_app_svc: bool,
    services: Group<Service>,
    any: bool,
}

impl Application {
    pub fn new(
        name: impl Into<String>,
        app_id: u16,
        services: Group<Service>,
        options: SharedOptions,
        use_app_svc: bool,
    ) -> Self {
        Application {
            name: name.into(),
            value: Mvalue::singleton(DomainKind::Application, app_id as u128),
            options,
            use_app_svc,
            services,
            any: false,
        }
    }

    pub fn any() -> Self {
        Application {
            name: "any".to_string(),
            value: Mvalue::spanning(DomainKind::Application),
            options: crate::options::OptionsCell::empty(),
            use_app_svc: false,
            services: Group::with_item("$any-svc-group", Arc::new(Service::any())),
            any: true,
        }
    }

    pub fn id(&self) -> u16 {
        self.value.range().lb() as u16
    }

    pub fn use_app_svc(&self) -> bool {
        self.use_app_svc
    }

    /// The services this application intrinsically uses.
    pub fn default_services(&self) -> &Group<Service> {
        &self.services
    }

    /// A copy of this application bound to another service set. Used when
    /// filtering application-default rules: each probed application is
    /// re-paired with the probed services before the subset test.
    pub fn with_services(&self, services: Group<Service>) -> Application {
        Application {
            name: self.name.clone(),
            value: self.value.clone(),
            options: Arc::clone(&self.options),
            use_app_svc: true,
            services,
            any: false,
        }
    }
}

impl Atom for Application {
    fn name(&self) -> &str {
        &self.name
    }

    fn make_bdd(&self, dom: &Domains) -> Bdd {
        if self.any {
            return dom.mk_true();
        }

        let mut condition = dom.mk_true();
        if self.options.get().applications {
            condition = condition.and(&self.value.make_bdd(dom));
        }
        if self.use_app_svc {
            condition = condition.and(&self.services.make_bdd(dom));
        }
        condition
    }

    fn value_text(&self) -> String {
        if self.any {
            "any".to_string()
        } else {
            self.value.to_string()
        }
    }

    fn is_any(&self) -> bool {
        self.any
    }
}

impl Group<Application> {
    /// The union of the member applications' default services, marked with
    /// the application-default name.
    pub fn default_services(&self) -> Group<Service> {
        let mut services = Group::new(APP_DEFAULT_SERVICES);
        for application in self.items() {
            for service in application.default_services().items() {
                services.add_item(service);
            }
        }
        services
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ModelOptions, OptionsCell};

    fn web_services() -> Group<Service> {
        let mut g = Group::new("web-svc");
        g.add_item(Arc::new(Service::tcp("http", 80, 80)));
        g.add_item(Arc::new(Service::tcp("https", 443, 443)));
        g
    }

    #[test]
    fn modeling_toggle_changes_the_compiled_condition() {
        let dom = Domains::new();
        let options = OptionsCell::new(ModelOptions::none());
        let app = Application::new("browser", 4, web_services(), Arc::clone(&options), false);

        assert!(app.make_bdd(&dom).is_true());
        options.set_applications(true);
        assert!(!app.make_bdd(&dom).is_true());
    }

    #[test]
    fn app_svc_coupling_requires_a_default_service() {
        let dom = Domains::new();
        let options = OptionsCell::new(ModelOptions::none());
        let app = Application::new("browser", 4, web_services(), options, true);
        assert_eq!(app.make_bdd(&dom), web_services().make_bdd(&dom));
    }

    #[test]
    fn group_default_services_union_members() {
        let options = OptionsCell::empty();
        let mut dns_svc = Group::new("dns-svc");
        dns_svc.add_item(Arc::new(Service::udp("dns", 53, 53)));

        let mut apps = Group::new("apps");
        apps.add_item(Arc::new(Application::new(
            "browser",
            1,
            web_services(),
            Arc::clone(&options),
            true,
        )));
        apps.add_item(Arc::new(Application::new("dns", 2, dns_svc, options, true)));

        let defaults = apps.default_services();
        assert_eq!(defaults.name(), APP_DEFAULT_SERVICES);
        assert_eq!(defaults.items().len(), 3);
    }
}
