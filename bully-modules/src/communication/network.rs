use bully::{new_err, Result, Transport};
use crossbeam_channel::{Receiver, Sender};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::sync::Arc;
use std::thread;

pub const DEFAULT_GROUP_ADDR: Ipv4Addr = Ipv4Addr::new(224, 1, 1, 1);
pub const DEFAULT_PORT: u16 = 5007;

const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Group broadcast over UDP multicast. Several processes on one host may share the port; every
/// member receives its own datagrams back through the multicast loopback.
#[derive(Clone, Debug)]
pub struct UdpMulticastTransport {
    socket: Arc<UdpSocket>,
    group: SocketAddrV4,
    inbound_rx: Receiver<Vec<u8>>,
}

impl UdpMulticastTransport {
    /// Joins the multicast group and starts the datagram receiver thread.
    pub fn new(group_addr: Ipv4Addr, port: u16) -> Result<UdpMulticastTransport> {
        if !group_addr.is_multicast() {
            return new_err(
                format!("{} is not a multicast address", group_addr),
                String::new(),
            );
        }

        let socket = match open_socket(group_addr, port) {
            Ok(socket) => Arc::new(socket),
            Err(err) => {
                return new_err(
                    format!("Cannot join multicast group {}:{}", group_addr, port),
                    err.to_string(),
                )
            }
        };

        let (inbound_tx, inbound_rx) = crossbeam_channel::unbounded();
        let receiver_socket = socket.clone();
        thread::spawn(move || receive_datagrams(receiver_socket, inbound_tx));

        info!("Joined multicast group {}:{}", group_addr, port);

        Ok(UdpMulticastTransport {
            socket,
            group: SocketAddrV4::new(group_addr, port),
            inbound_rx,
        })
    }
}

fn open_socket(group_addr: Ipv4Addr, port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SockAddr::from(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)))?;
    socket.join_multicast_v4(&group_addr, &Ipv4Addr::UNSPECIFIED)?;
    socket.set_multicast_loop_v4(true)?;

    Ok(socket.into())
}

// Runs until every receiver of the inbound channel is dropped.
fn receive_datagrams(socket: Arc<UdpSocket>, inbound_tx: Sender<Vec<u8>>) {
    let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
    loop {
        match socket.recv_from(&mut buffer) {
            Ok((size, source)) => {
                trace!("Datagram of {} bytes from {}", size, source);
                if inbound_tx.send(buffer[..size].to_vec()).is_err() {
                    debug!("Inbound channel closed, multicast receiver stopped");
                    return;
                }
            }
            Err(err) => warn!("Cannot receive datagram: {}", err),
        }
    }
}

impl Transport for UdpMulticastTransport {
    fn broadcast(&self, data: Vec<u8>) -> Result<()> {
        match self.socket.send_to(&data, self.group) {
            Ok(_) => Ok(()),
            Err(err) => new_err(
                format!("Cannot send datagram to {}", self.group),
                err.to_string(),
            ),
        }
    }

    fn inbound_rx(&self) -> Receiver<Vec<u8>> {
        self.inbound_rx.clone()
    }
}
