use std::net::Ipv4Addr;

/// How the resolver ranks an interface address.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddressClass {
    Public,
    /// RFC 1918: 10/8, 172.16/12, 192.168/16.
    Private,
    /// Loopback or unspecified; never advertised.
    Unusable,
}

pub fn classify(addr: Ipv4Addr) -> AddressClass {
    if addr.is_loopback() || addr.is_unspecified() {
        AddressClass::Unusable
    } else if addr.is_private() {
        AddressClass::Private
    } else {
        AddressClass::Public
    }
}

/// Source of candidate interface addresses, in enumeration order.
pub trait InterfaceSource: Send + Sync {
    fn ipv4_addrs(&self) -> Vec<Ipv4Addr>;
}

/// Interfaces of this machine via `getifaddrs`: up, non-loopback, IPv4 only.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn ipv4_addrs(&self) -> Vec<Ipv4Addr> {
        list_active_v4()
    }
}

/// Enumerate active non-loopback IPv4 interface addresses.
/// Returns an empty Vec if enumeration fails.
pub fn list_active_v4() -> Vec<Ipv4Addr> {
    use getifaddrs::{Address, InterfaceFlags};

    let ifaces = match getifaddrs::getifaddrs() {
        Ok(i) => i,
        Err(e) => {
            tracing::warn!("Failed to enumerate network interfaces: {}", e);
            return vec![];
        }
    };
    ifaces
        .filter(|i| i.flags.contains(InterfaceFlags::UP))
        .filter(|i| !i.flags.contains(InterfaceFlags::LOOPBACK))
        .filter_map(|i| match &i.address {
            Address::V4(net_addr) if !net_addr.address.is_loopback() => {
                tracing::debug!("Interface {} has {}", i.name, net_addr.address);
                Some(net_addr.address)
            }
            _ => None,
        })
        .collect()
}

/// First public address wins outright; otherwise the first private one seen.
pub fn pick_best(addrs: &[Ipv4Addr]) -> Option<Ipv4Addr> {
    let mut first_private = None;
    for &addr in addrs {
        match classify(addr) {
            AddressClass::Public => {
                tracing::info!("Found public IP: {}", addr);
                return Some(addr);
            }
            AddressClass::Private if first_private.is_none() => {
                tracing::info!("Found private IP: {}", addr);
                first_private = Some(addr);
            }
            _ => {}
        }
    }
    first_private
}
