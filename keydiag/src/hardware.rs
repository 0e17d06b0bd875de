//! Hardware wiring: the backend and connection seams, implemented on
//! the transport crate's types.
//!
//! Session wrappers are lazy: each call builds a fresh transport
//! session (re-selecting the application where the transport needs
//! that), so one failed read never poisons the connection for the
//! probes that follow.

use keydiag_transport as transport;
use transport::{ConfigRead, DeviceHandle, FidoHidConnection};

use crate::backend::{
    Ctap2Session, FidoBackend, FidoConnection, ManagementAccess, ManagementSession, OathSession,
    OpenPgpSession, OtpBackend, OtpConnection, OtpSession, PivSession, SmartCardBackend,
    SmartCardConnection,
};
use crate::error::{Error, Result};

struct MgmtOver<'a, C: ConfigRead + ?Sized>(&'a mut C);

impl<C: ConfigRead + ?Sized> ManagementSession for MgmtOver<'_, C> {
    fn read_raw_config(&mut self) -> Result<Vec<u8>> {
        Ok(transport::ManagementSession::new(&mut *self.0)?.read_raw_config()?)
    }

    fn read_device_info(&mut self) -> Result<transport::DeviceInfo> {
        Ok(transport::ManagementSession::new(&mut *self.0)?.read_device_info()?)
    }
}

struct PivOver<'a>(&'a mut transport::ScardConnection);

impl PivSession for PivOver<'_> {
    fn summary(&mut self) -> Result<transport::PivSummary> {
        Ok(transport::PivSession::new(&mut *self.0)?.summary()?)
    }
}

struct OathOver<'a>(&'a mut transport::ScardConnection);

impl OathSession for OathOver<'_> {
    fn info(&mut self) -> Result<transport::OathInfo> {
        Ok(transport::OathSession::new(&mut *self.0)?.info().clone())
    }
}

struct OpenPgpOver<'a>(&'a mut transport::ScardConnection);

impl OpenPgpSession for OpenPgpOver<'_> {
    fn read_info(&mut self) -> Result<transport::OpenPgpInfo> {
        Ok(transport::OpenPgpSession::new(&mut *self.0)?.read_info()?)
    }
}

struct OtpOver<'a>(&'a mut transport::OtpHidConnection);

impl OtpSession for OtpOver<'_> {
    fn read_state(&mut self) -> Result<transport::OtpState> {
        Ok(transport::OtpSession::new(&mut *self.0).read_state()?)
    }
}

struct Ctap2Over<'a>(&'a mut FidoHidConnection);

impl Ctap2Session for Ctap2Over<'_> {
    fn get_info(&mut self) -> Result<transport::Ctap2Info> {
        Ok(transport::Ctap2Session::new(&mut *self.0).get_info()?)
    }

    fn pin_retries(&mut self) -> Result<u64> {
        Ok(transport::Ctap2Session::new(&mut *self.0).pin_retries()?)
    }

    fn uv_retries(&mut self) -> Result<u64> {
        Ok(transport::Ctap2Session::new(&mut *self.0).uv_retries()?)
    }
}

impl ManagementAccess for transport::ScardConnection {
    fn management(&mut self) -> Box<dyn ManagementSession + '_> {
        Box::new(MgmtOver(self))
    }
}

impl SmartCardConnection for transport::ScardConnection {
    fn piv(&mut self) -> Box<dyn PivSession + '_> {
        Box::new(PivOver(self))
    }

    fn oath(&mut self) -> Box<dyn OathSession + '_> {
        Box::new(OathOver(self))
    }

    fn openpgp(&mut self) -> Box<dyn OpenPgpSession + '_> {
        Box::new(OpenPgpOver(self))
    }
}

impl ManagementAccess for transport::OtpHidConnection {
    fn management(&mut self) -> Box<dyn ManagementSession + '_> {
        Box::new(MgmtOver(self))
    }
}

impl OtpConnection for transport::OtpHidConnection {
    fn otp(&mut self) -> Box<dyn OtpSession + '_> {
        Box::new(OtpOver(self))
    }
}

impl ManagementAccess for FidoHidConnection {
    fn management(&mut self) -> Box<dyn ManagementSession + '_> {
        Box::new(MgmtOver(self))
    }
}

impl FidoConnection for FidoHidConnection {
    fn ctap2(&mut self) -> Box<dyn Ctap2Session + '_> {
        Box::new(Ctap2Over(self))
    }

    fn protocol_version(&self) -> u8 {
        FidoHidConnection::protocol_version(self)
    }

    fn device_version(&self) -> transport::Version {
        FidoHidConnection::device_version(self)
    }

    fn capabilities(&self) -> u8 {
        FidoHidConnection::capabilities(self)
    }
}

impl SmartCardBackend for transport::PcscBackend {
    fn list_readers(&self) -> Result<Vec<String>> {
        transport::PcscBackend::list_readers(self).map_err(Error::enumeration)
    }

    fn test_reader(&self, name: &str) -> Result<()> {
        transport::PcscBackend::test_reader(self, name).map_err(|e| match e {
            // The reader health line shows the terse error name, not
            // the long human message.
            transport::Error::Pcsc(inner) => Error::Connection(format!("{inner:?}")),
            other => Error::connection(other),
        })
    }

    fn list_devices(&self) -> Result<Vec<DeviceHandle>> {
        transport::PcscBackend::list_devices(self).map_err(Error::enumeration)
    }

    fn open(&self, device: &DeviceHandle) -> Result<Box<dyn SmartCardConnection + '_>> {
        let conn = transport::PcscBackend::open(self, device).map_err(Error::connection)?;
        Ok(Box::new(conn))
    }
}

impl OtpBackend for transport::HidOtpBackend {
    fn list_devices(&self) -> Result<Vec<DeviceHandle>> {
        transport::HidOtpBackend::list_devices(self).map_err(Error::enumeration)
    }

    fn open(&self, device: &DeviceHandle) -> Result<Box<dyn OtpConnection + '_>> {
        let conn = transport::HidOtpBackend::open(self, device).map_err(Error::connection)?;
        Ok(Box::new(conn))
    }
}

impl FidoBackend for transport::HidFidoBackend {
    fn list_devices(&self) -> Result<Vec<DeviceHandle>> {
        transport::HidFidoBackend::list_devices(self).map_err(Error::enumeration)
    }

    fn open(&self, device: &DeviceHandle) -> Result<Box<dyn FidoConnection + '_>> {
        let conn = transport::HidFidoBackend::open(self, device).map_err(Error::connection)?;
        Ok(Box::new(conn))
    }
}
