//! Class registrations for the descriptor model.
//!
//! Method names follow the descriptor's setter vocabulary (`setFilterName`,
//! `addInitParameter`, ...) so the rule set reads the same as the element names it
//! binds.

use trellis::{Child, ClassBuilder, ClassResolver, ClassResolverBuilder, ObjectRef};

use crate::model::{
    EjbRef, EnvEntry, ErrorPage, FilterDef, FilterMap, LocalEjbRef, LoginConfig,
    MessageDestination, MessageDestinationRef, NamingResources, ResourceEnvRef, ResourceRef,
    SecurityCollection, SecurityConstraint, SecurityRoleRef, Servlet, WebApp, CONTAINER_TYPE,
    CONTEXT_TYPE,
};

/// A resolver holding every descriptor class.
#[must_use]
pub fn resolver() -> ClassResolver {
    register_classes(ClassResolverBuilder::new()).build()
}

/// Add every descriptor class to `builder`.
#[must_use]
pub fn register_classes(builder: ClassResolverBuilder) -> ClassResolverBuilder {
    builder
        .class(web_app())
        .class(naming_resources())
        .class(filter_def())
        .class(filter_map())
        .class(error_page())
        .class(login_config())
        .class(security_constraint())
        .class(security_collection())
        .class(security_role_ref())
        .class(servlet())
        .class(message_destination())
        .class(message_destination_ref())
        .class(ejb_ref())
        .class(local_ejb_ref())
        .class(env_entry())
        .class(resource_ref())
        .class(resource_env_ref())
}

fn web_app() -> trellis::Class {
    ClassBuilder::<WebApp>::new()
        .implements(CONTEXT_TYPE)
        .default_constructor()
        .method("setPublicId", |w: &mut WebApp, id: String| {
            w.public_id = Some(id)
        })
        .method("setDisplayName", |w: &mut WebApp, v: String| {
            w.display_name = Some(v)
        })
        .method("setDistributable", |w: &mut WebApp, v: bool| {
            w.distributable = v
        })
        .method("addParameter", |w: &mut WebApp, name: String, value: String| {
            w.parameters.insert(name, value);
        })
        .method("addFilterDef", |w: &mut WebApp, Child(f): Child<FilterDef>| {
            w.filter_defs.push(f)
        })
        .method("addFilterMap", |w: &mut WebApp, Child(m): Child<FilterMap>| {
            w.add_filter_map(m)
        })
        .method("addErrorPage", |w: &mut WebApp, Child(p): Child<ErrorPage>| {
            w.error_pages.push(p)
        })
        .method("addApplicationListener", |w: &mut WebApp, v: String| {
            w.application_listeners.push(v)
        })
        .method("addJspMapping", |w: &mut WebApp, v: String| {
            w.jsp_mappings.push(v)
        })
        .method("setLoginConfig", |w: &mut WebApp, Child(c): Child<LoginConfig>| {
            w.login_config = Some(c)
        })
        .method("addMimeMapping", |w: &mut WebApp, ext: String, mime: String| {
            w.mime_mappings.insert(ext, mime);
        })
        .method(
            "addMessageDestination",
            |w: &mut WebApp, Child(d): Child<MessageDestination>| w.message_destinations.push(d),
        )
        .method(
            "addMessageDestinationRef",
            |w: &mut WebApp, Child(r): Child<MessageDestinationRef>| {
                w.message_destination_refs.push(r)
            },
        )
        .method(
            "addConstraint",
            |w: &mut WebApp, Child(c): Child<SecurityConstraint>| w.constraints.push(c),
        )
        .method("addSecurityRole", |w: &mut WebApp, v: String| {
            w.security_roles.push(v)
        })
        // Declared as any container; only servlets are children of an application.
        .method("addChild", |w: &mut WebApp, child: ObjectRef| {
            let servlet = child
                .downcast_clone::<Servlet>()
                .ok_or_else(|| format!("{} cannot be a child of an application", child.type_name()))?;
            w.servlets.push(servlet);
            Ok::<_, String>(())
        })
        .method("addServletMapping", |w: &mut WebApp, pattern: String, name: String| {
            w.add_servlet_mapping(pattern, name)
        })
        .method("setSessionTimeout", |w: &mut WebApp, minutes: i32| {
            w.session_timeout = Some(minutes)
        })
        .method("addTaglib", |w: &mut WebApp, uri: String, location: String| {
            w.taglibs.insert(uri, location);
        })
        .method("addWelcomeFile", |w: &mut WebApp, v: String| {
            w.welcome_files.push(v)
        })
        .method(
            "addLocaleEncodingMappingParameter",
            |w: &mut WebApp, locale: String, encoding: String| {
                w.locale_encodings.insert(locale, encoding);
            },
        )
        .build()
}

fn naming_resources() -> trellis::Class {
    ClassBuilder::<NamingResources>::new()
        .default_constructor()
        .method("addEjb", |n: &mut NamingResources, Child(e): Child<EjbRef>| {
            n.ejbs.push(e)
        })
        .method(
            "addLocalEjb",
            |n: &mut NamingResources, Child(e): Child<LocalEjbRef>| n.local_ejbs.push(e),
        )
        .method(
            "addEnvironment",
            |n: &mut NamingResources, Child(e): Child<EnvEntry>| n.environments.push(e),
        )
        .method(
            "addResource",
            |n: &mut NamingResources, Child(r): Child<ResourceRef>| n.resources.push(r),
        )
        .method(
            "addResourceEnvRef",
            |n: &mut NamingResources, Child(r): Child<ResourceEnvRef>| {
                n.resource_env_refs.push(r)
            },
        )
        .build()
}

fn filter_def() -> trellis::Class {
    ClassBuilder::<FilterDef>::new()
        .default_constructor()
        .method("setFilterName", |f: &mut FilterDef, v: String| {
            f.filter_name = v
        })
        .method("setFilterClass", |f: &mut FilterDef, v: String| {
            f.filter_class = Some(v)
        })
        .method("setDescription", |f: &mut FilterDef, v: String| {
            f.description = Some(v)
        })
        .method("setDisplayName", |f: &mut FilterDef, v: String| {
            f.display_name = Some(v)
        })
        .method("setLargeIcon", |f: &mut FilterDef, v: String| {
            f.large_icon = Some(v)
        })
        .method("setSmallIcon", |f: &mut FilterDef, v: String| {
            f.small_icon = Some(v)
        })
        .method(
            "addInitParameter",
            |f: &mut FilterDef, name: String, value: String| {
                f.init_parameters.insert(name, value);
            },
        )
        .build()
}

fn filter_map() -> trellis::Class {
    ClassBuilder::<FilterMap>::new()
        .default_constructor()
        .method("setFilterName", |m: &mut FilterMap, v: String| {
            m.filter_name = v
        })
        .method("setServletName", |m: &mut FilterMap, v: String| {
            m.servlet_name = Some(v)
        })
        .method("setURLPattern", |m: &mut FilterMap, v: String| {
            m.url_pattern = Some(v)
        })
        .method("setDispatcher", |m: &mut FilterMap, v: String| {
            m.add_dispatcher(v)
        })
        .build()
}

fn error_page() -> trellis::Class {
    ClassBuilder::<ErrorPage>::new()
        .default_constructor()
        // Malformed codes map to 0.
        .method("setErrorCode", |p: &mut ErrorPage, v: String| {
            p.error_code = v.trim().parse().unwrap_or(0)
        })
        .method("setExceptionType", |p: &mut ErrorPage, v: String| {
            p.exception_type = Some(v)
        })
        .method("setLocation", |p: &mut ErrorPage, v: String| {
            p.location = Some(v)
        })
        .build()
}

fn login_config() -> trellis::Class {
    ClassBuilder::<LoginConfig>::new()
        .default_constructor()
        .method("setAuthMethod", |c: &mut LoginConfig, v: String| {
            c.auth_method = Some(v)
        })
        .method("setRealmName", |c: &mut LoginConfig, v: String| {
            c.realm_name = Some(v)
        })
        .method("setLoginPage", |c: &mut LoginConfig, v: String| {
            c.login_page = Some(v)
        })
        .method("setErrorPage", |c: &mut LoginConfig, v: String| {
            c.error_page = Some(v)
        })
        .build()
}

fn security_constraint() -> trellis::Class {
    ClassBuilder::<SecurityConstraint>::new()
        .default_constructor()
        .method("setDisplayName", |c: &mut SecurityConstraint, v: String| {
            c.display_name = Some(v)
        })
        .method("setAuthConstraint", |c: &mut SecurityConstraint, v: bool| {
            c.auth_constraint = v
        })
        .method("addAuthRole", |c: &mut SecurityConstraint, v: String| {
            c.auth_roles.push(v)
        })
        .method("setUserConstraint", |c: &mut SecurityConstraint, v: String| {
            c.user_constraint = Some(v)
        })
        .method(
            "addCollection",
            |c: &mut SecurityConstraint, Child(s): Child<SecurityCollection>| c.collections.push(s),
        )
        .build()
}

fn security_collection() -> trellis::Class {
    ClassBuilder::<SecurityCollection>::new()
        .default_constructor()
        .method("setName", |c: &mut SecurityCollection, v: String| {
            c.name = Some(v)
        })
        .method("addMethod", |c: &mut SecurityCollection, v: String| {
            c.methods.push(v)
        })
        .method("addPattern", |c: &mut SecurityCollection, v: String| {
            c.patterns.push(v)
        })
        .build()
}

fn security_role_ref() -> trellis::Class {
    ClassBuilder::<SecurityRoleRef>::new()
        .default_constructor()
        .method("setName", |r: &mut SecurityRoleRef, v: String| r.name = v)
        .method("setLink", |r: &mut SecurityRoleRef, v: String| r.link = v)
        .build()
}

fn servlet() -> trellis::Class {
    ClassBuilder::<Servlet>::new()
        .implements(CONTAINER_TYPE)
        .default_constructor()
        .method("setName", |s: &mut Servlet, v: String| s.name = v)
        .method("setServletClass", |s: &mut Servlet, v: String| {
            s.servlet_class = Some(v)
        })
        .method("setJspFile", |s: &mut Servlet, v: String| {
            s.jsp_file = Some(v)
        })
        .method("setLoadOnStartupString", |s: &mut Servlet, v: String| {
            s.set_load_on_startup(&v)
        })
        .method("setRunAs", |s: &mut Servlet, v: String| s.run_as = Some(v))
        .method(
            "addInitParameter",
            |s: &mut Servlet, name: String, value: String| {
                s.init_parameters.insert(name, value);
            },
        )
        .build()
}

fn message_destination() -> trellis::Class {
    ClassBuilder::<MessageDestination>::new()
        .default_constructor()
        .method("setName", |d: &mut MessageDestination, v: String| d.name = v)
        .method("setDescription", |d: &mut MessageDestination, v: String| {
            d.description = Some(v)
        })
        .method("setDisplayName", |d: &mut MessageDestination, v: String| {
            d.display_name = Some(v)
        })
        .method("setLargeIcon", |d: &mut MessageDestination, v: String| {
            d.large_icon = Some(v)
        })
        .method("setSmallIcon", |d: &mut MessageDestination, v: String| {
            d.small_icon = Some(v)
        })
        .build()
}

fn message_destination_ref() -> trellis::Class {
    ClassBuilder::<MessageDestinationRef>::new()
        .default_constructor()
        .method("setName", |r: &mut MessageDestinationRef, v: String| r.name = v)
        .method("setDescription", |r: &mut MessageDestinationRef, v: String| {
            r.description = Some(v)
        })
        .method("setLink", |r: &mut MessageDestinationRef, v: String| {
            r.link = Some(v)
        })
        .method("setType", |r: &mut MessageDestinationRef, v: String| {
            r.ref_type = Some(v)
        })
        .method("setUsage", |r: &mut MessageDestinationRef, v: String| {
            r.usage = Some(v)
        })
        .build()
}

fn ejb_ref() -> trellis::Class {
    ClassBuilder::<EjbRef>::new()
        .default_constructor()
        .method("setName", |e: &mut EjbRef, v: String| e.name = v)
        .method("setDescription", |e: &mut EjbRef, v: String| {
            e.description = Some(v)
        })
        .method("setLink", |e: &mut EjbRef, v: String| e.link = Some(v))
        .method("setType", |e: &mut EjbRef, v: String| e.ref_type = Some(v))
        .method("setHome", |e: &mut EjbRef, v: String| e.home = Some(v))
        .method("setRemote", |e: &mut EjbRef, v: String| e.remote = Some(v))
        .build()
}

fn local_ejb_ref() -> trellis::Class {
    ClassBuilder::<LocalEjbRef>::new()
        .default_constructor()
        .method("setName", |e: &mut LocalEjbRef, v: String| e.name = v)
        .method("setDescription", |e: &mut LocalEjbRef, v: String| {
            e.description = Some(v)
        })
        .method("setLink", |e: &mut LocalEjbRef, v: String| e.link = Some(v))
        .method("setType", |e: &mut LocalEjbRef, v: String| {
            e.ref_type = Some(v)
        })
        .method("setHome", |e: &mut LocalEjbRef, v: String| e.home = Some(v))
        .method("setLocal", |e: &mut LocalEjbRef, v: String| e.local = Some(v))
        .build()
}

fn env_entry() -> trellis::Class {
    ClassBuilder::<EnvEntry>::new()
        .default_constructor()
        .method("setName", |e: &mut EnvEntry, v: String| e.name = v)
        .method("setDescription", |e: &mut EnvEntry, v: String| {
            e.description = Some(v)
        })
        .method("setType", |e: &mut EnvEntry, v: String| {
            e.entry_type = Some(v)
        })
        .method("setValue", |e: &mut EnvEntry, v: String| e.value = Some(v))
        .build()
}

fn resource_ref() -> trellis::Class {
    ClassBuilder::<ResourceRef>::new()
        .default_constructor()
        .method("setName", |r: &mut ResourceRef, v: String| r.name = v)
        .method("setDescription", |r: &mut ResourceRef, v: String| {
            r.description = Some(v)
        })
        .method("setAuth", |r: &mut ResourceRef, v: String| r.auth = Some(v))
        .method("setScope", |r: &mut ResourceRef, v: String| r.scope = Some(v))
        .method("setType", |r: &mut ResourceRef, v: String| {
            r.ref_type = Some(v)
        })
        .build()
}

fn resource_env_ref() -> trellis::Class {
    ClassBuilder::<ResourceEnvRef>::new()
        .default_constructor()
        .method("setName", |r: &mut ResourceEnvRef, v: String| r.name = v)
        .method("setType", |r: &mut ResourceEnvRef, v: String| {
            r.ref_type = Some(v)
        })
        .build()
}
